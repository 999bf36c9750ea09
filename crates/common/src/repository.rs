//! Typed access to metadata entries
//!
//! Every entry lives under the storage node and is told apart by its type
//! id. Calls for different entries never wait on each other, and calls for
//! the same entry are not serialized here either: the hash chain makes the
//! losing writer fail with [`MetadataError::WriteConflict`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::credentials::WalletCredentials;
use crate::entry::MetadataEntry;
use crate::interactor::{MetadataError, MetadataInteractor};
use crate::registry::{MetadataNodes, NodeRegistry, RegistryError};
use crate::remote::RemoteStore;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("failed to serialize {entry}: {source}")]
    Serialize {
        entry: MetadataEntry,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to deserialize {entry}: {source}")]
    Deserialize {
        entry: MetadataEntry,
        #[source]
        source: serde_json::Error,
    },
}

pub struct MetadataRepository<S> {
    interactor: MetadataInteractor<S>,
    registry: NodeRegistry<S>,
    credentials: Arc<dyn WalletCredentials>,
}

impl<S: RemoteStore> MetadataRepository<S> {
    pub fn new(interactor: MetadataInteractor<S>, credentials: Arc<dyn WalletCredentials>) -> Self {
        Self {
            registry: NodeRegistry::new(interactor.clone()),
            interactor,
            credentials,
        }
    }

    pub fn interactor(&self) -> &MetadataInteractor<S> {
        &self.interactor
    }

    pub fn registry(&self) -> &NodeRegistry<S> {
        &self.registry
    }

    /// Load the registry with the wallet's second password
    ///
    /// Only needed on the first session of a double-encrypted wallet; after
    /// the bundle exists the nodes load from credentials alone.
    pub async fn unlock(
        &self,
        second_password: &str,
    ) -> Result<Arc<MetadataNodes>, RepositoryError> {
        Ok(self
            .registry
            .load(self.credentials.as_ref(), Some(second_password))
            .await?)
    }

    /// Discard the session's node keys
    pub async fn reset(&self) {
        self.registry.reset().await;
    }

    pub async fn load<T: DeserializeOwned>(
        &self,
        entry: MetadataEntry,
    ) -> Result<Option<T>, RepositoryError> {
        let Some(json) = self.load_raw(entry).await? else {
            return Ok(None);
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| RepositoryError::Deserialize { entry, source })
    }

    pub async fn save<T: Serialize>(
        &self,
        entry: MetadataEntry,
        value: &T,
    ) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(value)
            .map_err(|source| RepositoryError::Serialize { entry, source })?;
        self.save_raw(entry, &json).await
    }

    /// Decrypted JSON text of `entry`, for callers doing their own parsing
    pub async fn load_raw(&self, entry: MetadataEntry) -> Result<Option<String>, RepositoryError> {
        let nodes = self.nodes().await?;
        Ok(self.interactor.load(&nodes.storage, entry.type_id()).await?)
    }

    pub async fn save_raw(&self, entry: MetadataEntry, json: &str) -> Result<(), RepositoryError> {
        let nodes = self.nodes().await?;
        tracing::debug!(entry = %entry, "saving metadata entry");
        Ok(self
            .interactor
            .save(&nodes.storage, entry.type_id(), json)
            .await?)
    }

    /// Session nodes, loading the registry on first use
    pub async fn nodes(&self) -> Result<Arc<MetadataNodes>, RegistryError> {
        match self.registry.nodes() {
            Some(nodes) => Ok(nodes),
            None => self.registry.load(self.credentials.as_ref(), None).await,
        }
    }
}
