use std::fmt::Debug;

use async_trait::async_trait;

use crate::crypto::PublicKey;
use crate::envelope::MetadataEnvelope;

mod cache;
mod memory;

pub use cache::{CachePolicy, CachedRemoteStore};
pub use memory::{MemoryRemoteStore, MemoryRemoteStoreError};

/// Outcome classes of the remote key-value service
///
/// Transports decide the class once, at the boundary; everything above the
/// store matches on the variant instead of inspecting status codes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteStoreError<T> {
    /// Unhandled provider failure (network, server error, lock poisoning)
    #[error("unhandled remote store error: {0}")]
    Provider(#[from] T),
    /// No document at the address for this type, or, on a write, the
    ///  antecedent the write names does not exist
    #[error("document not found")]
    NotFound,
    /// The write's `prevMagicHash` is not the current chain head;
    ///  another writer committed first
    #[error("write conflicts with the current document")]
    Conflict,
    /// The store refused the write outright (bad signature, version, ...)
    #[error("write rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait RemoteStore: Send + Sync + Debug + Clone + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the current document for `type_id` at `address`
    ///
    /// # Returns
    /// * `Ok(envelope)` - The document currently held
    /// * `Err(RemoteStoreError::NotFound)` - Nothing has been written yet
    async fn get(
        &self,
        address: &PublicKey,
        type_id: i32,
    ) -> Result<MetadataEnvelope, RemoteStoreError<Self::Error>>;

    /// Replace the document for `envelope.type_id` at `address`
    ///
    /// Should fail with the following errors to be considered
    ///  correct:
    /// * `Err(RemoteStoreError::NotFound)` - `prev_magic_hash` names a
    ///   document that does not exist
    /// * `Err(RemoteStoreError::Conflict)` - `prev_magic_hash` is not the
    ///   magic of the current document
    /// * `Err(RemoteStoreError::Rejected)` - signature or version invalid
    async fn put(
        &self,
        address: &PublicKey,
        envelope: MetadataEnvelope,
    ) -> Result<(), RemoteStoreError<Self::Error>>;
}
