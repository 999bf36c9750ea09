use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::crypto::{PublicKey, PUBLIC_KEY_SIZE};
use crate::envelope::MetadataEnvelope;
use crate::remote::{MemoryRemoteStore, MemoryRemoteStoreError, RemoteStore, RemoteStoreError};

type DocumentKey = ([u8; PUBLIC_KEY_SIZE], i32);

/// Answers the first `failures` PUTs with NotFound without forwarding them
#[derive(Debug, Clone)]
pub struct FlakyRemoteStore<S> {
    inner: S,
    remaining_failures: Arc<AtomicUsize>,
    put_attempts: Arc<AtomicUsize>,
}

impl<S: RemoteStore> FlakyRemoteStore<S> {
    pub fn new(inner: S, failures: usize) -> Self {
        Self {
            inner,
            remaining_failures: Arc::new(AtomicUsize::new(failures)),
            put_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Every PUT seen, failed or forwarded
    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for FlakyRemoteStore<S> {
    type Error = S::Error;

    async fn get(
        &self,
        address: &PublicKey,
        type_id: i32,
    ) -> Result<MetadataEnvelope, RemoteStoreError<Self::Error>> {
        self.inner.get(address, type_id).await
    }

    async fn put(
        &self,
        address: &PublicKey,
        envelope: MetadataEnvelope,
    ) -> Result<(), RemoteStoreError<Self::Error>> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            tracing::debug!(address = %address, "flaky store failing put with not found");
            return Err(RemoteStoreError::NotFound);
        }

        self.inner.put(address, envelope).await
    }
}

/// Fails every GET with a provider error while offline
///
/// PUTs are counted and forwarded, so a test can tell whether a caller went
/// on to write after a read it could not complete.
#[derive(Debug, Clone)]
pub struct OfflineRemoteStore {
    inner: MemoryRemoteStore,
    offline: Arc<AtomicBool>,
    put_attempts: Arc<AtomicUsize>,
}

impl OfflineRemoteStore {
    /// Starts offline
    pub fn new(inner: MemoryRemoteStore) -> Self {
        Self {
            inner,
            offline: Arc::new(AtomicBool::new(true)),
            put_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for OfflineRemoteStore {
    type Error = MemoryRemoteStoreError;

    async fn get(
        &self,
        address: &PublicKey,
        type_id: i32,
    ) -> Result<MetadataEnvelope, RemoteStoreError<Self::Error>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteStoreError::Provider(MemoryRemoteStoreError::Internal(
                "remote unreachable".to_string(),
            )));
        }
        self.inner.get(address, type_id).await
    }

    async fn put(
        &self,
        address: &PublicKey,
        envelope: MetadataEnvelope,
    ) -> Result<(), RemoteStoreError<Self::Error>> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(address, envelope).await
    }
}

/// Serves every GET after [`freeze`](SnapshotRemoteStore::freeze) from the
/// first answer it got for that document
///
/// PUTs pass straight through, so a writer using this store behaves like a
/// second device that read the document before someone else changed it.
#[derive(Debug, Clone)]
pub struct SnapshotRemoteStore<S> {
    inner: S,
    snapshot: Arc<Mutex<Option<HashMap<DocumentKey, Option<MetadataEnvelope>>>>>,
}

impl<S: RemoteStore> SnapshotRemoteStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            snapshot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn freeze(&self) {
        *self.snapshot.lock() = Some(HashMap::new());
    }

    pub fn thaw(&self) {
        *self.snapshot.lock() = None;
    }
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for SnapshotRemoteStore<S> {
    type Error = S::Error;

    async fn get(
        &self,
        address: &PublicKey,
        type_id: i32,
    ) -> Result<MetadataEnvelope, RemoteStoreError<Self::Error>> {
        let key = (address.to_bytes(), type_id);
        let frozen = {
            let snapshot = self.snapshot.lock();
            match snapshot.as_ref() {
                Some(documents) => match documents.get(&key) {
                    Some(document) => return document.clone().ok_or(RemoteStoreError::NotFound),
                    None => true,
                },
                None => false,
            }
        };

        let result = self.inner.get(address, type_id).await;
        // Provider errors are not part of the snapshot
        let document = match &result {
            Ok(envelope) => Some(Some(envelope.clone())),
            Err(RemoteStoreError::NotFound) => Some(None),
            Err(_) => None,
        };
        if let (true, Some(document)) = (frozen, document) {
            if let Some(documents) = self.snapshot.lock().as_mut() {
                documents.entry(key).or_insert(document);
            }
        }
        result
    }

    async fn put(
        &self,
        address: &PublicKey,
        envelope: MetadataEnvelope,
    ) -> Result<(), RemoteStoreError<Self::Error>> {
        self.inner.put(address, envelope).await
    }
}
