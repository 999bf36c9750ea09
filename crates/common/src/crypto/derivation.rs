//! SLIP-0010 Ed25519 derivation of metadata nodes.
//!
//! Two nodes hang off the wallet's master seed at fixed hardened purposes:
//!
//! ```text
//! seed ──HMAC-SHA512("ed25519 seed")──▶ m
//!                                       ├── 510742'  storage node
//!                                       └── 510743'  shared node
//! ```
//!
//! The index node is derived from login credentials alone so that a fresh
//! session can find the registry bundle before it has the master seed:
//!
//! ```text
//! BLAKE3-derive-key(guid, shared key, password) ──▶ 32-byte seed ──▶ m/0'
//! ```
//!
//! Only hardened derivation exists for Ed25519 (SLIP-0010 §3).

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::credentials::MasterKey;
use crate::crypto::SecretKey;
use crate::node::DerivedNode;

type HmacSha512 = Hmac<Sha512>;

/// The hardened index offset (0x80000000) per BIP-32/SLIP-0010.
const HARDENED_OFFSET: u32 = 0x8000_0000;

/// HMAC key for master key generation per SLIP-0010 §2.
const MASTER_HMAC_KEY: &[u8] = b"ed25519 seed";

/// Hardened purpose of the node holding all metadata entries
pub const METADATA_PURPOSE: u32 = 510742;
/// Hardened purpose of the node shared with linked services
pub const SHARED_METADATA_PURPOSE: u32 = 510743;
/// Hardened child of the credential seed used as the index node
pub const INDEX_PURPOSE: u32 = 0;

/// BIP-32 seed bounds
pub const MIN_SEED_LEN: usize = 16;
pub const MAX_SEED_LEN: usize = 64;

const INDEX_NODE_CONTEXT: &str = "metavault 2024-06-01 metadata index node v1";

#[derive(Debug, thiserror::Error)]
pub enum DerivationError {
    #[error("invalid seed length {0}, expected {MIN_SEED_LEN}..={MAX_SEED_LEN} bytes")]
    InvalidSeedLength(usize),
    #[error("credential `{0}` must not be empty")]
    EmptyCredential(&'static str),
    #[error("hardened index {0} out of range")]
    IndexOutOfRange(u32),
    #[error("HMAC-SHA512 key init failed")]
    Hmac,
}

/// Derive the storage node that holds every metadata entry
pub fn derive_storage_node(master: &MasterKey) -> Result<DerivedNode, DerivationError> {
    derive_path(master.as_bytes(), &[METADATA_PURPOSE])
}

/// Derive the node shared with linked services
pub fn derive_shared_node(master: &MasterKey) -> Result<DerivedNode, DerivationError> {
    derive_path(master.as_bytes(), &[SHARED_METADATA_PURPOSE])
}

/// Derive the index node from login credentials
///
/// Same credentials always give the same node, which is what lets a new
/// session locate the registry bundle without the second password.
pub fn derive_index_node(
    guid: &str,
    shared_key: &str,
    password: &str,
) -> Result<DerivedNode, DerivationError> {
    if guid.is_empty() {
        return Err(DerivationError::EmptyCredential("guid"));
    }
    if shared_key.is_empty() {
        return Err(DerivationError::EmptyCredential("shared_key"));
    }

    // length-prefix each field so ("ab", "c") and ("a", "bc") differ
    let mut hasher = blake3::Hasher::new_derive_key(INDEX_NODE_CONTEXT);
    for field in [guid, shared_key, password] {
        hasher.update(&(field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    let mut seed = *hasher.finalize().as_bytes();

    let node = derive_path(&seed, &[INDEX_PURPOSE]);
    seed.zeroize();
    node
}

fn derive_path(seed: &[u8], path: &[u32]) -> Result<DerivedNode, DerivationError> {
    if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
        return Err(DerivationError::InvalidSeedLength(seed.len()));
    }

    let (mut key, mut chain_code) = master_key_from_seed(seed)?;

    for &index in path {
        let (child_key, child_chain) = derive_hardened_child(&key, &chain_code, index)?;
        key.zeroize();
        chain_code.zeroize();
        key = child_key;
        chain_code = child_chain;
    }

    let node = DerivedNode::new(SecretKey::from(key));

    key.zeroize();
    chain_code.zeroize();

    Ok(node)
}

/// `I = HMAC-SHA512(key="ed25519 seed", data=seed)`
/// `IL = I[0..32]` = master key, `IR = I[32..64]` = chain code.
fn master_key_from_seed(seed: &[u8]) -> Result<([u8; 32], [u8; 32]), DerivationError> {
    let i = hmac_sha512(MASTER_HMAC_KEY, seed)?;
    Ok(split(&i))
}

/// `I = HMAC-SHA512(key=chain_code, data=0x00 || parent_key || ser32(index | 0x80000000))`
fn derive_hardened_child(
    parent_key: &[u8; 32],
    parent_chain_code: &[u8; 32],
    index: u32,
) -> Result<([u8; 32], [u8; 32]), DerivationError> {
    if index >= HARDENED_OFFSET {
        return Err(DerivationError::IndexOutOfRange(index));
    }

    let mut data = [0u8; 37];
    data[1..33].copy_from_slice(parent_key);
    data[33..37].copy_from_slice(&(index | HARDENED_OFFSET).to_be_bytes());

    let i = hmac_sha512(parent_chain_code, &data);
    data.zeroize();

    Ok(split(&i?))
}

fn split(i: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&i[..32]);
    right.copy_from_slice(&i[32..]);
    (left, right)
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<[u8; 64], DerivationError> {
    let mut mac = HmacSha512::new_from_slice(key).map_err(|_| DerivationError::Hmac)?;
    mac.update(data);
    let result = mac.finalize().into_bytes();

    let mut output = [0u8; 64];
    output.copy_from_slice(&result);
    Ok(output)
}
