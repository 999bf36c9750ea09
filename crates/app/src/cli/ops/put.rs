use clap::Args;

use common::entry::MetadataEntry;
use common::repository::RepositoryError;

use crate::cli::op::SessionError;

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Entry name (e.g. `shapeshift`) or type id (e.g. `6`)
    #[arg(long)]
    pub entry: MetadataEntry,

    /// JSON document replacing the current one
    #[arg(long)]
    pub value: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to save {0}: {1}")]
    Save(MetadataEntry, #[source] RepositoryError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Put {
    type Error = PutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.session().await?;

        session
            .repository
            .save_raw(self.entry, &self.value)
            .await
            .map_err(|e| PutError::Save(self.entry, e))?;

        Ok(format!("saved {} (type id {})", self.entry, self.entry.type_id()))
    }
}
