//! Typed entry access through the repository
mod common;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ::common::entry::MetadataEntry;
use ::common::events::MetadataEvent;
use ::common::interactor::MetadataError;
use ::common::registry::RegistryError;
use ::common::remote::MemoryRemoteStore;
use ::common::repository::RepositoryError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletConnectSessions {
    sessions: Vec<String>,
    last_used: Option<u64>,
}

#[tokio::test]
async fn test_every_entry_round_trips() {
    common::init_tracing();
    let repository = common::repository(MemoryRemoteStore::new(), common::plain_wallet());

    for entry in MetadataEntry::ALL {
        assert!(repository.load_raw(*entry).await.unwrap().is_none());
        let value = serde_json::json!({ "entry": entry.name(), "id": entry.type_id() });
        repository.save(*entry, &value).await.unwrap();
    }

    for entry in MetadataEntry::ALL {
        let loaded: serde_json::Value = repository.load(*entry).await.unwrap().unwrap();
        assert_eq!(loaded["id"], entry.type_id());
    }
}

#[tokio::test]
async fn test_entries_share_the_storage_address() {
    let store = MemoryRemoteStore::new();
    let repository = common::repository(store.clone(), common::plain_wallet());
    let sessions = WalletConnectSessions {
        sessions: vec!["wc:abc".into()],
        last_used: Some(1_700_000_000),
    };

    repository
        .save(MetadataEntry::WalletConnect, &sessions)
        .await
        .unwrap();
    repository
        .save_raw(MetadataEntry::Stellar, r#"{"accounts":[]}"#)
        .await
        .unwrap();

    let address = common::storage_node().address();
    assert_eq!(
        store
            .history(&address, MetadataEntry::WalletConnect.type_id())
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        store
            .history(&address, MetadataEntry::Stellar.type_id())
            .unwrap()
            .len(),
        1
    );

    let loaded: WalletConnectSessions = repository
        .load(MetadataEntry::WalletConnect)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, sessions);
}

#[tokio::test]
async fn test_unlock_then_use_double_encrypted_wallet() {
    let store = MemoryRemoteStore::new();
    let repository = common::repository(store.clone(), common::sealed_wallet());

    let blocked = repository.load_raw(MetadataEntry::Ethereum).await;
    assert!(matches!(
        blocked,
        Err(RepositoryError::Registry(RegistryError::DerivationBlocked))
    ));

    repository.unlock(common::SECOND_PASSWORD).await.unwrap();
    repository
        .save_raw(MetadataEntry::Ethereum, r#"{"ethereum":{"accounts":[]}}"#)
        .await
        .unwrap();

    // Logout and back in: the bundle now stands in for the second password
    repository.reset().await;
    assert_eq!(
        repository
            .load_raw(MetadataEntry::Ethereum)
            .await
            .unwrap()
            .as_deref(),
        Some(r#"{"ethereum":{"accounts":[]}}"#)
    );
}

#[tokio::test]
async fn test_non_json_raw_value_is_rejected_before_io() {
    let store = MemoryRemoteStore::new();
    let repository = common::repository(store.clone(), common::plain_wallet());

    let result = repository
        .save_raw(MetadataEntry::Contacts, "contacts: none")
        .await;

    assert!(matches!(
        result,
        Err(RepositoryError::Metadata(MetadataError::MalformedInput(_)))
    ));
    assert!(store
        .history(
            &common::storage_node().address(),
            MetadataEntry::Contacts.type_id()
        )
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_concurrent_writes_to_different_entries() {
    let repository = Arc::new(common::repository(
        MemoryRemoteStore::new(),
        common::plain_wallet(),
    ));
    let updates = repository.interactor().events().subscribe();

    let mut handles = Vec::new();
    for entry in [
        MetadataEntry::Bitcoin,
        MetadataEntry::BitcoinCash,
        MetadataEntry::Ethereum,
        MetadataEntry::Stellar,
    ] {
        let repository = repository.clone();
        handles.push(tokio::spawn(async move {
            repository
                .save(entry, &serde_json::json!({ "label": entry.name() }))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let events: Vec<_> = updates.drain().collect();
    // one more for the registry bundle written on first use
    assert_eq!(events, vec![MetadataEvent::Updated; 5]);
}
