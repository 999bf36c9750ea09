use clap::Args;

use common::crypto::derivation::{self, DerivationError};
use common::registry::RegistryError;

use crate::cli::op::SessionError;

/// Show the addresses of this wallet's metadata nodes
#[derive(Args, Debug, Clone)]
pub struct Nodes;

#[derive(Debug, thiserror::Error)]
pub enum NodesError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Derivation(#[from] DerivationError),
    #[error("failed to load metadata nodes: {0}")]
    Registry(#[from] RegistryError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Nodes {
    type Error = NodesError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.session().await?;
        let wallet = &session.state.wallet;
        let index = derivation::derive_index_node(
            &wallet.guid,
            &wallet.shared_key,
            ctx.password.as_deref().unwrap_or_default(),
        )?;

        let nodes = session.repository.nodes().await?;

        Ok(format!(
            "index:   {}\nstorage: {}\nshared:  {}",
            index.address(),
            nodes.storage.address(),
            nodes.shared.address()
        ))
    }
}
