use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as, DisplayFromStr};

use crate::crypto::{MagicHash, PublicKey, SecretKey, Signature};

/// Protocol generation written into every envelope
pub const METADATA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed signature: {0}")]
    MalformedSignature(#[from] ed25519_dalek::SignatureError),
    #[error("signature does not verify against address {0}")]
    BadSignature(PublicKey),
}

/// A metadata document as it travels to and from the remote store
///
/// ```json
/// {"version":1,"payload":"<base64>","signature":"<base64>","prevMagicHash":"<hex>"|null,"typeId":6}
/// ```
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEnvelope {
    pub version: u32,
    /// Ciphertext produced by the node's encryption key
    #[serde_as(as = "Base64")]
    pub payload: Vec<u8>,
    /// Ed25519 signature over `magic(payload, prev_magic_hash)`
    #[serde_as(as = "Base64")]
    pub signature: Vec<u8>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub prev_magic_hash: Option<MagicHash>,
    pub type_id: i32,
}

impl MetadataEnvelope {
    /// Build and sign an envelope for `ciphertext` chained onto `prev_magic_hash`
    pub fn signed(
        signer: &SecretKey,
        type_id: i32,
        ciphertext: Vec<u8>,
        prev_magic_hash: Option<MagicHash>,
    ) -> Self {
        let magic = MagicHash::compute(&ciphertext, prev_magic_hash.as_ref());
        let signature = signer.sign(magic.as_bytes());

        Self {
            version: METADATA_VERSION,
            payload: ciphertext,
            signature: signature.to_bytes().to_vec(),
            prev_magic_hash,
            type_id,
        }
    }

    /// The chain value of this document; the next write must name it as its
    /// `prevMagicHash`
    pub fn magic_hash(&self) -> MagicHash {
        MagicHash::compute(&self.payload, self.prev_magic_hash.as_ref())
    }

    /// Check that `address` signed this envelope
    pub fn verify(&self, address: &PublicKey) -> Result<(), EnvelopeError> {
        let signature = Signature::from_slice(&self.signature)?;
        address
            .verify(self.magic_hash().as_bytes(), &signature)
            .map_err(|_| EnvelopeError::BadSignature(*address))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wire_format_field_names() {
        let key = SecretKey::from([3u8; 32]);
        let envelope = MetadataEnvelope::signed(&key, 6, vec![1, 2, 3], None);
        let json: serde_json::Value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["version"], 1);
        assert_eq!(json["payload"], "AQID");
        assert_eq!(json["typeId"], 6);
        assert!(json["prevMagicHash"].is_null());
        assert!(json["signature"].is_string());
    }

    #[test]
    fn test_prev_magic_hash_is_hex_on_the_wire() {
        let key = SecretKey::from([3u8; 32]);
        let prev = MagicHash::compute(b"earlier", None);
        let envelope = MetadataEnvelope::signed(&key, 6, vec![9], Some(prev));

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains(&prev.to_string()));

        let parsed: MetadataEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_missing_prev_magic_hash_reads_as_chain_start() {
        let json = r#"{"version":1,"payload":"AQID","signature":"","typeId":6}"#;
        let parsed: MetadataEnvelope = serde_json::from_str(json).unwrap();
        assert!(parsed.prev_magic_hash.is_none());
    }

    #[test]
    fn test_signature_binds_payload_and_antecedent() {
        let key = SecretKey::from([3u8; 32]);
        let address = key.public();
        let envelope = MetadataEnvelope::signed(&key, 6, vec![1, 2, 3], None);
        assert!(envelope.verify(&address).is_ok());

        let mut tampered = envelope.clone();
        tampered.payload = vec![1, 2, 4];
        assert!(matches!(
            tampered.verify(&address),
            Err(EnvelopeError::BadSignature(_))
        ));

        let mut rechained = envelope.clone();
        rechained.prev_magic_hash = Some(MagicHash::compute(b"x", None));
        assert!(rechained.verify(&address).is_err());

        let stranger = SecretKey::from([4u8; 32]).public();
        assert!(envelope.verify(&stranger).is_err());
    }

    #[test]
    fn test_truncated_signature_is_malformed() {
        let key = SecretKey::from([3u8; 32]);
        let mut envelope = MetadataEnvelope::signed(&key, 6, vec![1], None);
        envelope.signature.truncate(10);
        assert!(matches!(
            envelope.verify(&key.public()),
            Err(EnvelopeError::MalformedSignature(_))
        ));
    }
}
