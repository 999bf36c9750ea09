use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{RemoteStore, RemoteStoreError};
use crate::crypto::{PublicKey, PUBLIC_KEY_SIZE};
use crate::envelope::{MetadataEnvelope, METADATA_VERSION};

type DocumentKey = ([u8; PUBLIC_KEY_SIZE], i32);

/// In-memory metadata service enforcing the hash-chain write rules
#[derive(Debug, Clone)]
pub struct MemoryRemoteStore {
    inner: Arc<RwLock<MemoryRemoteStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryRemoteStoreInner {
    /// Accepted writes per (address, type id), oldest first;
    ///  the last one is the current document
    documents: HashMap<DocumentKey, Vec<MetadataEnvelope>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryRemoteStoreError {
    #[error("memory store error: {0}")]
    Internal(String),
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryRemoteStoreInner::default())),
        }
    }

    /// Every accepted write for the document, oldest first
    pub fn history(
        &self,
        address: &PublicKey,
        type_id: i32,
    ) -> Result<Vec<MetadataEnvelope>, MemoryRemoteStoreError> {
        let inner = self.inner.read().map_err(|e| {
            MemoryRemoteStoreError::Internal(format!("failed to acquire read lock: {}", e))
        })?;

        Ok(inner
            .documents
            .get(&(address.to_bytes(), type_id))
            .cloned()
            .unwrap_or_default())
    }
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    type Error = MemoryRemoteStoreError;

    async fn get(
        &self,
        address: &PublicKey,
        type_id: i32,
    ) -> Result<MetadataEnvelope, RemoteStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            RemoteStoreError::Provider(MemoryRemoteStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        inner
            .documents
            .get(&(address.to_bytes(), type_id))
            .and_then(|history| history.last())
            .cloned()
            .ok_or(RemoteStoreError::NotFound)
    }

    async fn put(
        &self,
        address: &PublicKey,
        envelope: MetadataEnvelope,
    ) -> Result<(), RemoteStoreError<Self::Error>> {
        if envelope.version != METADATA_VERSION {
            return Err(RemoteStoreError::Rejected(format!(
                "unsupported version {}",
                envelope.version
            )));
        }

        envelope
            .verify(address)
            .map_err(|e| RemoteStoreError::Rejected(e.to_string()))?;

        let mut inner = self.inner.write().map_err(|e| {
            RemoteStoreError::Provider(MemoryRemoteStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        let history = inner
            .documents
            .entry((address.to_bytes(), envelope.type_id))
            .or_default();

        match (history.last(), &envelope.prev_magic_hash) {
            // Genesis
            (None, None) => {}
            // Chained onto a document we never saw
            (None, Some(_)) => return Err(RemoteStoreError::NotFound),
            (Some(current), prev) => {
                if prev.as_ref() != Some(&current.magic_hash()) {
                    return Err(RemoteStoreError::Conflict);
                }
            }
        }

        history.push(envelope);
        Ok(())
    }
}
