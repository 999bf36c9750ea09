use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

/// Size of a magic hash in bytes
pub const MAGIC_HASH_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum MagicHashError {
    #[error("magic hash hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Rolling hash over a document's ciphertext chained with its antecedent
///
/// `magic(c, prev) = SHA-256(prev || SHA-256(c))`, with `prev` omitted at
/// the start of a chain. The remote store keeps the magic of the document it
/// currently holds; a write is accepted only when it names that value as its
/// `prevMagicHash`, so a writer working from stale state is rejected.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MagicHash([u8; MAGIC_HASH_SIZE]);

impl MagicHash {
    pub fn compute(ciphertext: &[u8], previous: Option<&MagicHash>) -> Self {
        let message = Sha256::digest(ciphertext);
        let mut hasher = Sha256::new();
        if let Some(previous) = previous {
            hasher.update(previous.0);
        }
        hasher.update(message);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; MAGIC_HASH_SIZE] {
        &self.0
    }
}

impl From<[u8; MAGIC_HASH_SIZE]> for MagicHash {
    fn from(bytes: [u8; MAGIC_HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for MagicHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for MagicHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MagicHash({})", self)
    }
}

impl FromStr for MagicHash {
    type Err = MagicHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut buff = [0u8; MAGIC_HASH_SIZE];
        hex::decode_to_slice(s, &mut buff)?;
        Ok(Self(buff))
    }
}
