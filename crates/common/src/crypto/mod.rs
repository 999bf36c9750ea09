//! Cryptographic primitives for the metadata store
//!
//! - **Node keys**: Ed25519 keypairs (`SecretKey`/`PublicKey`). The public key
//!   is the node's address on the remote store and verifies its writes.
//! - **Derivation**: SLIP-0010 hardened derivation of the storage, shared
//!   and index nodes.
//! - **Encryption**: ChaCha20-Poly1305 `Secret` keys derived from node keys.
//! - **Magic hash**: the SHA-256 chain used for optimistic concurrency.

pub mod derivation;
mod keys;
mod magic;
mod secret;

pub use ed25519_dalek::Signature;
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use magic::{MagicHash, MagicHashError, MAGIC_HASH_SIZE};
pub use secret::{Secret, SecretError, SECRET_SIZE};
