use clap::Args;

use common::entry::MetadataEntry;
use common::repository::RepositoryError;

use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Entry name (e.g. `shapeshift`) or type id (e.g. `6`)
    #[arg(long)]
    pub entry: MetadataEntry,

    /// Pretty-print the JSON document
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to load {0}: {1}")]
    Load(MetadataEntry, #[source] RepositoryError),
    #[error("failed to format document: {0}")]
    Format(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.session().await?;

        let document = session
            .repository
            .load_raw(self.entry)
            .await
            .map_err(|e| GetError::Load(self.entry, e))?;

        let Some(json) = document else {
            return Ok(format!("{} is not set", self.entry));
        };

        if self.pretty {
            let value: serde_json::Value = serde_json::from_str(&json)?;
            return Ok(serde_json::to_string_pretty(&value)?);
        }
        Ok(json)
    }
}
