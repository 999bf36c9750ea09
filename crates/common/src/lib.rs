/**
 * Protocol tunables, loadable from toml/json.
 */
pub mod config;
/**
 * Wallet credentials the registry derives from.
 *  The wallet owns the seed; we only borrow it.
 */
pub mod credentials;
/**
 * Cryptographic types and operations.
 *  - Ed25519 node keys and SLIP-0010 derivation
 *  - ChaCha20-Poly1305 document encryption
 *  - Magic hash chain
 */
pub mod crypto;
/**
 * Registry of metadata document kinds
 *  and their wire type ids.
 */
pub mod entry;
/**
 * Signed wire format of a stored document.
 */
pub mod envelope;
pub mod events;
/**
 * Encrypt/sign/retry protocol on top of a
 *  remote store.
 */
pub mod interactor;
pub mod node;
/**
 * Session cache of derived nodes, backed
 *  by an encrypted bundle on the remote.
 */
pub mod registry;
/**
 * Remote key-value service abstraction.
 *  Includes an in-memory implementation and a
 *  read-through cache layer.
 */
pub mod remote;
pub mod repository;
/**
 * Store doubles for staging write races
 *  in tests.
 */
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::config::MetadataConfig;
    pub use crate::credentials::{LocalWallet, MasterKey, WalletCredentials};
    pub use crate::crypto::{MagicHash, PublicKey, SecretKey};
    pub use crate::entry::MetadataEntry;
    pub use crate::envelope::MetadataEnvelope;
    pub use crate::events::{MetadataEvent, MetadataEvents};
    pub use crate::interactor::{MetadataError, MetadataInteractor};
    pub use crate::node::DerivedNode;
    pub use crate::registry::{MetadataNodes, NodeRegistry, RegistryError};
    pub use crate::remote::{RemoteStore, RemoteStoreError};
    pub use crate::repository::{MetadataRepository, RepositoryError};
    pub use crate::version::build_info;
}
