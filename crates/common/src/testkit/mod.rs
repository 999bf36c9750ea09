/// Store doubles for exercising the write protocol in-process
///
/// Each wraps a real [`RemoteStore`](crate::remote::RemoteStore) (usually a
/// [`MemoryRemoteStore`](crate::remote::MemoryRemoteStore)) and bend one
/// aspect of it, so that races which need two devices in production can be
/// staged deterministically in a test.
///
/// # Example
///
/// ```rust,ignore
/// use common::remote::MemoryRemoteStore;
/// use common::testkit::SnapshotRemoteStore;
///
/// let backing = MemoryRemoteStore::new();
/// let stale = SnapshotRemoteStore::new(backing.clone());
///
/// // Reads through `stale` stop seeing new writes after this point
/// stale.freeze();
/// ```
mod stores;

pub use stores::{FlakyRemoteStore, OfflineRemoteStore, SnapshotRemoteStore};
