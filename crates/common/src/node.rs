use crate::crypto::{KeyError, PublicKey, Secret, SecretKey};

/// A derived key-pair plus the symmetric keys for its documents
///
/// `encryption_key` is the SHA-256 digest of the 32-byte private key.
/// Older clients serialized the private scalar as a minimal big-endian
/// integer, dropping leading zero bytes before hashing; for keys that start
/// with `0x00` the digest of that shorter form is kept as
/// `unpadded_encryption_key` so documents written by those clients still
/// decrypt. New writes always use `encryption_key`.
#[derive(Debug, Clone)]
pub struct DerivedNode {
    secret_key: SecretKey,
    encryption_key: Secret,
    unpadded_encryption_key: Option<Secret>,
}

impl DerivedNode {
    pub fn new(secret_key: SecretKey) -> Self {
        let bytes = secret_key.to_bytes();
        let encryption_key = Secret::from_digest(&bytes);

        let leading_zeros = bytes.iter().take_while(|b| **b == 0).count();
        let unpadded_encryption_key =
            (leading_zeros > 0).then(|| Secret::from_digest(&bytes[leading_zeros..]));

        Self {
            secret_key,
            encryption_key,
            unpadded_encryption_key,
        }
    }

    /// Rebuild a node from the hex private key stored in the registry bundle
    pub fn from_private_hex(hex: &str) -> Result<Self, KeyError> {
        Ok(Self::new(SecretKey::from_hex(hex)?))
    }

    pub fn private_hex(&self) -> String {
        self.secret_key.to_hex()
    }

    /// Address of this node's documents on the remote store
    pub fn address(&self) -> PublicKey {
        self.secret_key.public()
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn encryption_key(&self) -> &Secret {
        &self.encryption_key
    }

    pub fn unpadded_encryption_key(&self) -> Option<&Secret> {
        self.unpadded_encryption_key.as_ref()
    }
}
