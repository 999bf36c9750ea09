//! Session cache of the storage and shared nodes
//!
//! The first load in a session looks for the registry bundle under the index
//! node, which is derivable from login credentials alone. If the bundle is
//! missing the nodes are derived from the master seed and the bundle is
//! written so later sessions never need the seed (or a second password).
//!
//! ```text
//!   Unloaded ──load()──▶ Loaded
//!      ▲                   │
//!      └─────reset()───────┘
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::credentials::{CredentialsError, WalletCredentials};
use crate::crypto::derivation::{self, DerivationError};
use crate::entry::REGISTRY_TYPE_ID;
use crate::interactor::{MetadataError, MetadataInteractor};
use crate::node::DerivedNode;
use crate::remote::RemoteStore;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No bundle yet and the wallet needs its second password to derive one
    #[error("second password required to derive metadata nodes")]
    DerivationBlocked,
    /// Transient store failure while loading or saving the bundle
    #[error("metadata registry unavailable: {0}")]
    Unavailable(#[source] MetadataError),
    #[error("metadata registry bundle is corrupt: {0}")]
    Corrupt(String),
    #[error("derivation error: {0}")]
    Derivation(#[from] DerivationError),
    #[error("credentials error: {0}")]
    Credentials(#[from] CredentialsError),
}

/// Node key-pairs available once the registry is loaded
#[derive(Debug, Clone)]
pub struct MetadataNodes {
    /// Owner of every metadata entry
    pub storage: DerivedNode,
    /// Node handed to linked services
    pub shared: DerivedNode,
}

/// Persisted form of [`MetadataNodes`]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryBundle {
    storage_node_key: String,
    shared_node_key: String,
}

impl RegistryBundle {
    fn from_nodes(nodes: &MetadataNodes) -> Self {
        Self {
            storage_node_key: nodes.storage.private_hex(),
            shared_node_key: nodes.shared.private_hex(),
        }
    }

    fn into_nodes(self) -> Result<MetadataNodes, RegistryError> {
        let storage = DerivedNode::from_private_hex(&self.storage_node_key)
            .map_err(|e| RegistryError::Corrupt(format!("storage node key: {}", e)))?;
        let shared = DerivedNode::from_private_hex(&self.shared_node_key)
            .map_err(|e| RegistryError::Corrupt(format!("shared node key: {}", e)))?;
        Ok(MetadataNodes { storage, shared })
    }
}

#[derive(Debug)]
pub struct NodeRegistry<S> {
    interactor: MetadataInteractor<S>,
    /// Held across the whole first load so concurrent callers wait for one
    ///  bundle write instead of racing their own
    loading: Mutex<()>,
    /// Written only under `loading`; read freely once set
    nodes: RwLock<Option<Arc<MetadataNodes>>>,
}

impl<S: RemoteStore> NodeRegistry<S> {
    pub fn new(interactor: MetadataInteractor<S>) -> Self {
        Self {
            interactor,
            loading: Mutex::new(()),
            nodes: RwLock::new(None),
        }
    }

    /// Make the nodes available, loading or creating the bundle on first use
    pub async fn load(
        &self,
        credentials: &dyn WalletCredentials,
        second_password: Option<&str>,
    ) -> Result<Arc<MetadataNodes>, RegistryError> {
        if let Some(nodes) = self.nodes() {
            return Ok(nodes);
        }

        let _loading = self.loading.lock().await;
        // a caller we waited on may have finished the load
        if let Some(nodes) = self.nodes() {
            return Ok(nodes);
        }

        let index = derivation::derive_index_node(
            credentials.guid(),
            credentials.shared_key(),
            credentials.password(),
        )?;

        let nodes = match self.interactor.load(&index, REGISTRY_TYPE_ID).await {
            Ok(Some(json)) => {
                let bundle: RegistryBundle = serde_json::from_str(&json)
                    .map_err(|e| RegistryError::Corrupt(e.to_string()))?;
                tracing::info!(index = %index.address(), "loaded metadata registry bundle");
                bundle.into_nodes()?
            }
            Ok(None) => self.create(&index, credentials, second_password).await?,
            Err(MetadataError::DecryptionFailure(reason)) => {
                return Err(RegistryError::Corrupt(reason))
            }
            Err(e) => return Err(RegistryError::Unavailable(e)),
        };

        let nodes = Arc::new(nodes);
        *self.nodes.write() = Some(nodes.clone());
        Ok(nodes)
    }

    /// Cached nodes, `None` while unloaded
    pub fn nodes(&self) -> Option<Arc<MetadataNodes>> {
        self.nodes.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.nodes.read().is_some()
    }

    /// Forget the cached nodes
    ///
    /// Waits for a first load in progress so it cannot repopulate the cache
    /// after the reset.
    pub async fn reset(&self) {
        let _loading = self.loading.lock().await;
        if self.nodes.write().take().is_some() {
            tracing::info!("metadata registry reset");
        }
    }

    async fn create(
        &self,
        index: &DerivedNode,
        credentials: &dyn WalletCredentials,
        second_password: Option<&str>,
    ) -> Result<MetadataNodes, RegistryError> {
        if credentials.is_double_encrypted() && second_password.is_none() {
            return Err(RegistryError::DerivationBlocked);
        }

        let master = credentials.master_key(second_password)?;
        let nodes = MetadataNodes {
            storage: derivation::derive_storage_node(&master)?,
            shared: derivation::derive_shared_node(&master)?,
        };
        drop(master);

        let bundle = serde_json::to_string(&RegistryBundle::from_nodes(&nodes))
            .map_err(|e| RegistryError::Corrupt(e.to_string()))?;

        match self
            .interactor
            .save(index, REGISTRY_TYPE_ID, &bundle)
            .await
        {
            Ok(()) => {
                tracing::info!(index = %index.address(), "created metadata registry bundle");
            }
            // Another session wrote the bundle first. Same seed, same nodes.
            Err(MetadataError::WriteConflict) => {
                tracing::warn!(
                    index = %index.address(),
                    "metadata registry bundle written concurrently, using derived nodes"
                );
            }
            Err(e) => return Err(RegistryError::Unavailable(e)),
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetadataConfig;
    use crate::credentials::{LocalWallet, MasterKey};
    use crate::events::MetadataEvents;
    use crate::remote::MemoryRemoteStore;

    fn registry(store: MemoryRemoteStore) -> NodeRegistry<MemoryRemoteStore> {
        NodeRegistry::new(MetadataInteractor::new(
            store,
            MetadataConfig::default(),
            MetadataEvents::new(),
        ))
    }

    fn wallet() -> LocalWallet {
        LocalWallet::new(
            "guid".into(),
            "shared".into(),
            "password".into(),
            MasterKey::new(vec![3u8; 32]).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_first_load_writes_bundle() {
        let store = MemoryRemoteStore::new();
        let registry = registry(store.clone());
        let wallet = wallet();

        assert!(registry.nodes().is_none());
        let nodes = registry.load(&wallet, None).await.unwrap();

        let master = MasterKey::new(vec![3u8; 32]).unwrap();
        let expected = derivation::derive_storage_node(&master).unwrap();
        assert_eq!(nodes.storage.address(), expected.address());

        let index = derivation::derive_index_node("guid", "shared", "password").unwrap();
        assert_eq!(
            store
                .history(&index.address(), REGISTRY_TYPE_ID)
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_loaded_is_cached_until_reset() {
        let store = MemoryRemoteStore::new();
        let registry = registry(store.clone());
        let wallet = wallet();

        let first = registry.load(&wallet, None).await.unwrap();
        let second = registry.load(&wallet, None).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        registry.reset().await;
        assert!(!registry.is_loaded());

        let reloaded = registry.load(&wallet, None).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(first.storage.address(), reloaded.storage.address());
    }

    #[tokio::test]
    async fn test_loaded_nodes_skip_load_lock() {
        let registry = registry(MemoryRemoteStore::new());
        let loaded = registry.load(&wallet(), None).await.unwrap();

        // a held load lock does not block readers of loaded nodes
        let _loading = registry.loading.lock().await;
        let read = registry.nodes().unwrap();
        assert!(Arc::ptr_eq(&loaded, &read));
        let again = registry.load(&wallet(), None).await.unwrap();
        assert!(Arc::ptr_eq(&loaded, &again));
    }

    #[tokio::test]
    async fn test_unparsable_bundle_is_corrupt() {
        let store = MemoryRemoteStore::new();
        let registry = registry(store.clone());
        let index = derivation::derive_index_node("guid", "shared", "password").unwrap();

        registry
            .interactor
            .save(&index, REGISTRY_TYPE_ID, r#"{"storageNodeKey":"zz"}"#)
            .await
            .unwrap();

        let result = registry.load(&wallet(), None).await;
        assert!(matches!(result, Err(RegistryError::Corrupt(_))));
    }
}
