//! Shared helpers for metadata integration tests
#![allow(dead_code)]

use std::sync::Arc;

use ::common::config::MetadataConfig;
use ::common::credentials::{LocalWallet, MasterKey, SealParams, WalletCredentials};
use ::common::crypto::derivation;
use ::common::events::MetadataEvents;
use ::common::interactor::MetadataInteractor;
use ::common::node::DerivedNode;
use ::common::remote::RemoteStore;
use ::common::repository::MetadataRepository;

pub const GUID: &str = "6b1f2e52-3c1e-4a4c-9d0b-1f7a5e1c9a10";
pub const SHARED_KEY: &str = "c8a1b7e4-0a55-4f7e-8c11-2d3e4f5a6b7c";
pub const PASSWORD: &str = "correct horse battery staple";
pub const SECOND_PASSWORD: &str = "hunter2";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn master_key() -> MasterKey {
    MasterKey::new((0u8..32).collect()).unwrap()
}

/// Wallet with no second password
pub fn plain_wallet() -> Arc<dyn WalletCredentials> {
    Arc::new(LocalWallet::new(
        GUID.into(),
        SHARED_KEY.into(),
        PASSWORD.into(),
        master_key(),
    ))
}

/// Same seed as [`plain_wallet`], sealed under [`SECOND_PASSWORD`]
pub fn sealed_wallet() -> Arc<dyn WalletCredentials> {
    let params = SealParams {
        m_cost: 256,
        t_cost: 1,
        p_cost: 1,
    };
    let sealed = LocalWallet::seal_seed(GUID, &master_key(), SECOND_PASSWORD, params).unwrap();
    Arc::new(LocalWallet::sealed(
        GUID.into(),
        SHARED_KEY.into(),
        PASSWORD.into(),
        sealed,
    ))
}

pub fn storage_node() -> DerivedNode {
    derivation::derive_storage_node(&master_key()).unwrap()
}

pub fn index_node() -> DerivedNode {
    derivation::derive_index_node(GUID, SHARED_KEY, PASSWORD).unwrap()
}

pub fn interactor<S: RemoteStore>(store: S) -> MetadataInteractor<S> {
    MetadataInteractor::new(store, MetadataConfig::default(), MetadataEvents::new())
}

pub fn repository<S: RemoteStore>(
    store: S,
    wallet: Arc<dyn WalletCredentials>,
) -> MetadataRepository<S> {
    MetadataRepository::new(interactor(store), wallet)
}
