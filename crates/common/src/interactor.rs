//! Read/write protocol over a [`RemoteStore`]
//!
//! Writes are optimistic: the interactor reads the current chain head,
//! signs a new envelope naming it as `prevMagicHash`, and lets the store
//! reject the write if another writer moved the head in between. No lock is
//! held across the read-modify-write cycle.

use crate::config::MetadataConfig;
use crate::crypto::{MagicHash, SecretError};
use crate::envelope::MetadataEnvelope;
use crate::events::{MetadataEvent, MetadataEvents};
use crate::node::DerivedNode;
use crate::remote::{RemoteStore, RemoteStoreError};

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// A write kept naming a document the store does not have
    #[error("metadata document not found")]
    NotFound,
    /// Another writer committed first; re-read and re-apply
    #[error("metadata write conflict: document changed since it was read")]
    WriteConflict,
    /// Neither key decrypts the payload, or the plaintext is not JSON
    #[error("metadata decryption failed: {0}")]
    DecryptionFailure(String),
    /// Caller handed us something that is not JSON
    #[error("malformed metadata input: {0}")]
    MalformedInput(#[source] serde_json::Error),
    #[error("metadata encryption failed: {0}")]
    Encryption(#[source] SecretError),
    #[error("metadata write rejected: {0}")]
    Rejected(String),
    #[error("metadata transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl<E> From<RemoteStoreError<E>> for MetadataError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: RemoteStoreError<E>) -> Self {
        match err {
            RemoteStoreError::Provider(e) => MetadataError::Transport(Box::new(e)),
            RemoteStoreError::NotFound => MetadataError::NotFound,
            RemoteStoreError::Conflict => MetadataError::WriteConflict,
            RemoteStoreError::Rejected(reason) => MetadataError::Rejected(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataInteractor<S> {
    store: S,
    config: MetadataConfig,
    events: MetadataEvents,
}

impl<S: RemoteStore> MetadataInteractor<S> {
    pub fn new(store: S, config: MetadataConfig, events: MetadataEvents) -> Self {
        Self {
            store,
            config,
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    pub fn events(&self) -> &MetadataEvents {
        &self.events
    }

    /// Read and decrypt the document `type_id` owned by `node`
    ///
    /// Returns `Ok(None)` when the document was never written.
    pub async fn load(
        &self,
        node: &DerivedNode,
        type_id: i32,
    ) -> Result<Option<String>, MetadataError> {
        let address = node.address();
        let envelope = match self.store.get(&address, type_id).await {
            Ok(envelope) => envelope,
            Err(RemoteStoreError::NotFound) => {
                tracing::debug!(address = %address, type_id, "metadata not set");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let plaintext = decrypt_payload(node, &envelope.payload)?;
        Ok(Some(plaintext))
    }

    /// Encrypt, sign and submit `plaintext` as the new document `type_id`
    ///
    /// A PUT answered with NotFound is retried up to `put_retry_limit`
    /// times, recomputing the chain head each time. A conflict is returned
    /// as [`MetadataError::WriteConflict`] without retry.
    pub async fn save(
        &self,
        node: &DerivedNode,
        type_id: i32,
        plaintext: &str,
    ) -> Result<(), MetadataError> {
        serde_json::from_str::<serde_json::Value>(plaintext)
            .map_err(MetadataError::MalformedInput)?;

        let ciphertext = node
            .encryption_key()
            .encrypt(plaintext.as_bytes())
            .map_err(MetadataError::Encryption)?;

        let address = node.address();
        let mut retries = 0;
        loop {
            let prev_magic_hash = self.fetch_magic_hash(node, type_id).await?;
            let envelope = MetadataEnvelope::signed(
                node.secret_key(),
                type_id,
                ciphertext.clone(),
                prev_magic_hash,
            );

            match self.store.put(&address, envelope).await {
                Ok(()) => {
                    tracing::debug!(
                        address = %address,
                        type_id,
                        prev = ?prev_magic_hash,
                        "metadata saved"
                    );
                    self.events.publish(MetadataEvent::Updated);
                    return Ok(());
                }
                Err(RemoteStoreError::NotFound) if retries < self.config.put_retry_limit => {
                    retries += 1;
                    tracing::warn!(
                        address = %address,
                        type_id,
                        "metadata put returned not found, retrying ({}/{})",
                        retries,
                        self.config.put_retry_limit
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Current chain head of the document, `None` before its first write
    pub async fn fetch_magic_hash(
        &self,
        node: &DerivedNode,
        type_id: i32,
    ) -> Result<Option<MagicHash>, MetadataError> {
        match self.store.get(&node.address(), type_id).await {
            Ok(envelope) => Ok(Some(envelope.magic_hash())),
            Err(RemoteStoreError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn decrypt_payload(node: &DerivedNode, payload: &[u8]) -> Result<String, MetadataError> {
    let bytes = match node.encryption_key().decrypt(payload) {
        Ok(bytes) => bytes,
        Err(primary) => match node.unpadded_encryption_key() {
            Some(legacy) => {
                tracing::warn!(
                    address = %node.address(),
                    "metadata decrypt failed ({}), trying unpadded key",
                    primary
                );
                legacy
                    .decrypt(payload)
                    .map_err(|e| MetadataError::DecryptionFailure(e.to_string()))?
            }
            None => return Err(MetadataError::DecryptionFailure(primary.to_string())),
        },
    };

    let plaintext = String::from_utf8(bytes)
        .map_err(|_| MetadataError::DecryptionFailure("plaintext is not utf-8".to_string()))?;
    serde_json::from_str::<serde_json::Value>(&plaintext)
        .map_err(|e| MetadataError::DecryptionFailure(format!("plaintext is not json: {}", e)))?;

    Ok(plaintext)
}
