//! Node registry lifecycle across sessions and wallet kinds
mod common;

use std::sync::Arc;

use ::common::entry::REGISTRY_TYPE_ID;
use ::common::interactor::MetadataError;
use ::common::registry::{NodeRegistry, RegistryError};
use ::common::remote::MemoryRemoteStore;
use ::common::testkit::{FlakyRemoteStore, OfflineRemoteStore};

#[tokio::test]
async fn test_double_encrypted_wallet_without_bundle_is_blocked() {
    let store = MemoryRemoteStore::new();
    let registry = NodeRegistry::new(common::interactor(store.clone()));
    let wallet = common::sealed_wallet();

    let result = registry.load(wallet.as_ref(), None).await;

    assert!(matches!(result, Err(RegistryError::DerivationBlocked)));
    assert!(!registry.is_loaded());
    assert!(store
        .history(&common::index_node().address(), REGISTRY_TYPE_ID)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_wrong_second_password_is_credentials_error() {
    let registry = NodeRegistry::new(common::interactor(MemoryRemoteStore::new()));
    let wallet = common::sealed_wallet();

    let result = registry.load(wallet.as_ref(), Some("wrong")).await;
    assert!(matches!(result, Err(RegistryError::Credentials(_))));
}

#[tokio::test]
async fn test_later_session_loads_without_second_password() {
    let store = MemoryRemoteStore::new();
    let wallet = common::sealed_wallet();

    let first_session = NodeRegistry::new(common::interactor(store.clone()));
    let created = first_session
        .load(wallet.as_ref(), Some(common::SECOND_PASSWORD))
        .await
        .unwrap();
    assert_eq!(
        created.storage.address(),
        common::storage_node().address()
    );

    // Logout, then a new session on the same remote
    first_session.reset().await;
    let second_session = NodeRegistry::new(common::interactor(store.clone()));
    let loaded = second_session.load(wallet.as_ref(), None).await.unwrap();

    assert_eq!(loaded.storage.address(), created.storage.address());
    assert_eq!(loaded.shared.address(), created.shared.address());
    assert_eq!(
        store
            .history(&common::index_node().address(), REGISTRY_TYPE_ID)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_plain_and_sealed_wallets_agree() {
    let plain = NodeRegistry::new(common::interactor(MemoryRemoteStore::new()));
    let sealed = NodeRegistry::new(common::interactor(MemoryRemoteStore::new()));

    let a = plain.load(common::plain_wallet().as_ref(), None).await.unwrap();
    let b = sealed
        .load(
            common::sealed_wallet().as_ref(),
            Some(common::SECOND_PASSWORD),
        )
        .await
        .unwrap();

    assert_eq!(a.storage.address(), b.storage.address());
    assert_ne!(a.storage.address(), a.shared.address());
}

#[tokio::test]
async fn test_bundle_save_exhausting_retries_is_unavailable() {
    let store = FlakyRemoteStore::new(MemoryRemoteStore::new(), usize::MAX);
    let registry = NodeRegistry::new(common::interactor(store));

    let result = registry.load(common::plain_wallet().as_ref(), None).await;

    assert!(matches!(result, Err(RegistryError::Unavailable(_))));
    assert!(registry.nodes().is_none());
}

#[tokio::test]
async fn test_unreachable_store_is_unavailable_without_regenerating() {
    let backing = MemoryRemoteStore::new();
    let store = OfflineRemoteStore::new(backing.clone());
    let registry = NodeRegistry::new(common::interactor(store.clone()));
    let wallet = common::plain_wallet();

    let result = registry.load(wallet.as_ref(), None).await;

    assert!(matches!(
        result,
        Err(RegistryError::Unavailable(MetadataError::Transport(_)))
    ));
    assert!(registry.nodes().is_none());
    assert_eq!(store.put_attempts(), 0);
    assert!(backing
        .history(&common::index_node().address(), REGISTRY_TYPE_ID)
        .unwrap()
        .is_empty());

    // Remote back: the next load goes through the normal first-use path
    store.set_offline(false);
    let nodes = registry.load(wallet.as_ref(), None).await.unwrap();
    assert_eq!(nodes.storage.address(), common::storage_node().address());
    assert_eq!(store.put_attempts(), 1);
}

#[tokio::test]
async fn test_bundle_under_other_key_is_corrupt() {
    let store = MemoryRemoteStore::new();
    let interactor = common::interactor(store.clone());
    let index = common::index_node();

    // Signed by the index node but encrypted with a different key
    let ciphertext = common::storage_node()
        .encryption_key()
        .encrypt(br#"{"storageNodeKey":"00","sharedNodeKey":"00"}"#)
        .unwrap();
    let envelope = ::common::envelope::MetadataEnvelope::signed(
        index.secret_key(),
        REGISTRY_TYPE_ID,
        ciphertext,
        None,
    );
    ::common::remote::RemoteStore::put(&store, &index.address(), envelope)
        .await
        .unwrap();

    let registry = NodeRegistry::new(interactor);
    let result = registry.load(common::plain_wallet().as_ref(), None).await;
    assert!(matches!(result, Err(RegistryError::Corrupt(_))));
}

#[tokio::test]
async fn test_concurrent_first_loads_write_bundle_once() {
    let store = MemoryRemoteStore::new();
    let registry = Arc::new(NodeRegistry::new(common::interactor(store.clone())));
    let wallet = common::plain_wallet();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        let wallet = wallet.clone();
        handles.push(tokio::spawn(async move {
            registry.load(wallet.as_ref(), None).await
        }));
    }

    let mut addresses = Vec::new();
    for handle in handles {
        addresses.push(handle.await.unwrap().unwrap().storage.address());
    }
    addresses.dedup();

    assert_eq!(addresses.len(), 1);
    assert_eq!(
        store
            .history(&common::index_node().address(), REGISTRY_TYPE_ID)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_bundle_race_between_sessions_still_loads() {
    let backing = MemoryRemoteStore::new();
    let stale = ::common::testkit::SnapshotRemoteStore::new(backing.clone());
    stale.freeze();

    // Session B saw no bundle, then session A created it
    let session_b = NodeRegistry::new(common::interactor(stale.clone()));
    let index = common::index_node();
    assert!(common::interactor(stale.clone())
        .load(&index, REGISTRY_TYPE_ID)
        .await
        .unwrap()
        .is_none());

    let session_a = NodeRegistry::new(common::interactor(backing.clone()));
    let a = session_a
        .load(common::plain_wallet().as_ref(), None)
        .await
        .unwrap();

    let b = session_b
        .load(common::plain_wallet().as_ref(), None)
        .await
        .unwrap();

    assert_eq!(a.storage.address(), b.storage.address());
    assert_eq!(
        backing
            .history(&index.address(), REGISTRY_TYPE_ID)
            .unwrap()
            .len(),
        1
    );
}
