//! Read-through cache in front of any [`RemoteStore`]
//!
//! Caches both documents and absences. Any PUT on a key invalidates it,
//! whatever the outcome, since a failed write means our view is stale too.
//! Reads served from the cache can be older than the remote head; a write
//! built on such a read fails with `Conflict` and the retry sees fresh state.
//!
//! Each key carries a generation bumped by every PUT. A GET only stores its
//! result if the generation it started under is still current, so a read
//! that was in flight across a write cannot repopulate the pre-write value.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{RemoteStore, RemoteStoreError};
use crate::crypto::{PublicKey, PUBLIC_KEY_SIZE};
use crate::envelope::MetadataEnvelope;

type DocumentKey = ([u8; PUBLIC_KEY_SIZE], i32);

/// How long a cached GET result may be served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Every GET goes to the remote
    Disabled,
    /// Serve cached results younger than the given age
    MaxAge(Duration),
    /// Serve cached results until invalidated by a write
    Forever,
}

impl CachePolicy {
    fn is_fresh(&self, fetched_at: Instant) -> bool {
        match self {
            CachePolicy::Disabled => false,
            CachePolicy::MaxAge(max_age) => fetched_at.elapsed() < *max_age,
            CachePolicy::Forever => true,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedDocument {
    fetched_at: Instant,
    /// `None` caches a NotFound
    envelope: Option<MetadataEnvelope>,
}

#[derive(Debug, Default)]
struct CacheState {
    documents: HashMap<DocumentKey, CachedDocument>,
    generations: HashMap<DocumentKey, u64>,
}

impl CacheState {
    fn generation(&self, key: &DocumentKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct CachedRemoteStore<S> {
    inner: S,
    policy: CachePolicy,
    state: Arc<Mutex<CacheState>>,
}

impl<S: RemoteStore> CachedRemoteStore<S> {
    pub fn new(inner: S, policy: CachePolicy) -> Self {
        Self {
            inner,
            policy,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fresh cached result, or the generation a remote read starts under
    fn lookup(&self, key: &DocumentKey) -> Result<Option<MetadataEnvelope>, u64> {
        let state = self.state.lock();
        match state
            .documents
            .get(key)
            .filter(|cached| self.policy.is_fresh(cached.fetched_at))
        {
            Some(cached) => Ok(cached.envelope.clone()),
            None => Err(state.generation(key)),
        }
    }

    fn remember(&self, key: DocumentKey, generation: u64, envelope: Option<MetadataEnvelope>) {
        if self.policy == CachePolicy::Disabled {
            return;
        }
        let mut state = self.state.lock();
        if state.generation(&key) != generation {
            tracing::debug!(type_id = key.1, "dropping metadata read raced by a write");
            return;
        }
        state.documents.insert(
            key,
            CachedDocument {
                fetched_at: Instant::now(),
                envelope,
            },
        );
    }

    fn invalidate(&self, key: &DocumentKey) {
        let mut state = self.state.lock();
        state.documents.remove(key);
        *state.generations.entry(*key).or_insert(0) += 1;
    }
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for CachedRemoteStore<S> {
    type Error = S::Error;

    async fn get(
        &self,
        address: &PublicKey,
        type_id: i32,
    ) -> Result<MetadataEnvelope, RemoteStoreError<Self::Error>> {
        let key = (address.to_bytes(), type_id);

        let generation = match self.lookup(&key) {
            Ok(cached) => {
                tracing::debug!(address = %address, type_id, "metadata cache hit");
                return cached.ok_or(RemoteStoreError::NotFound);
            }
            Err(generation) => generation,
        };

        match self.inner.get(address, type_id).await {
            Ok(envelope) => {
                self.remember(key, generation, Some(envelope.clone()));
                Ok(envelope)
            }
            Err(RemoteStoreError::NotFound) => {
                self.remember(key, generation, None);
                Err(RemoteStoreError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    async fn put(
        &self,
        address: &PublicKey,
        envelope: MetadataEnvelope,
    ) -> Result<(), RemoteStoreError<Self::Error>> {
        let key = (address.to_bytes(), envelope.type_id);
        let result = self.inner.put(address, envelope).await;
        self.invalidate(&key);
        result
    }
}
