//! Wallet credentials consumed by the node registry
//!
//! The wallet subsystem owns the master seed and the login credentials; this
//! crate only borrows them through [`WalletCredentials`]. [`LocalWallet`] is a
//! self-contained implementation that keeps the seed either in the clear or
//! sealed under the wallet's second password.
//!
//! A sealed seed is encrypted with a key stretched from the second password
//! by Argon2id over a random per-wallet salt. The salt and cost parameters
//! travel with the ciphertext in [`SealedSeed`].

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::derivation::{DerivationError, MAX_SEED_LEN, MIN_SEED_LEN};
use crate::crypto::{Secret, SecretError, SECRET_SIZE};

/// Length of the random Argon2id salt
pub const SEAL_SALT_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("wallet is double encrypted and requires the second password")]
    SecondPasswordRequired,
    #[error("second password is incorrect")]
    InvalidSecondPassword,
    #[error("malformed master seed: {0}")]
    MalformedSeed(#[from] DerivationError),
    #[error("failed to seal master seed: {0}")]
    Seal(#[from] SecretError),
    #[error("second password key derivation failed: {0}")]
    Kdf(String),
    #[error("failed to generate random bytes: {0}")]
    Rng(#[from] getrandom::Error),
}

/// Argon2id cost of the second-password seal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealParams {
    /// Memory in KiB
    pub m_cost: u32,
    /// Passes over memory
    pub t_cost: u32,
    /// Lanes
    pub p_cost: u32,
}

impl Default for SealParams {
    fn default() -> Self {
        Self {
            m_cost: 65_536,
            t_cost: 3,
            p_cost: 1,
        }
    }
}

/// Master seed encrypted under the wallet's second password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSeed {
    pub salt: [u8; SEAL_SALT_LEN],
    pub params: SealParams,
    /// `nonce || ciphertext || tag` as produced by [`Secret::encrypt`]
    pub ciphertext: Vec<u8>,
}

/// Wallet master seed
///
/// Zeroized on drop. Only ever lives for the duration of a derivation.
pub struct MasterKey(Vec<u8>);

impl MasterKey {
    pub fn new(seed: Vec<u8>) -> Result<Self, DerivationError> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(DerivationError::InvalidSeedLength(seed.len()));
        }
        Ok(Self(seed))
    }

    pub fn generate() -> Result<Self, getrandom::Error> {
        let mut seed = vec![0u8; MAX_SEED_LEN];
        getrandom::getrandom(&mut seed)?;
        Ok(Self(seed))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKey({} bytes)", self.0.len())
    }
}

/// Credentials the wallet hands to the metadata layer
pub trait WalletCredentials: Send + Sync {
    fn guid(&self) -> &str;

    fn shared_key(&self) -> &str;

    fn password(&self) -> &str;

    /// Whether producing the master key needs the second password
    fn is_double_encrypted(&self) -> bool;

    /// Produce the master seed, checking `second_password` when the wallet
    /// is double encrypted
    fn master_key(&self, second_password: Option<&str>) -> Result<MasterKey, CredentialsError>;
}

enum SeedStorage {
    Plain(MasterKey),
    Sealed(SealedSeed),
}

/// In-process wallet holding its own seed
pub struct LocalWallet {
    guid: String,
    shared_key: String,
    password: String,
    seed: SeedStorage,
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("guid", &self.guid)
            .field("double_encrypted", &self.is_double_encrypted())
            .finish_non_exhaustive()
    }
}

impl LocalWallet {
    /// A wallet whose seed is available without a second password
    pub fn new(guid: String, shared_key: String, password: String, master: MasterKey) -> Self {
        Self {
            guid,
            shared_key,
            password,
            seed: SeedStorage::Plain(master),
        }
    }

    /// A double-encrypted wallet whose seed was sealed with [`LocalWallet::seal_seed`]
    pub fn sealed(
        guid: String,
        shared_key: String,
        password: String,
        sealed_seed: SealedSeed,
    ) -> Self {
        Self {
            guid,
            shared_key,
            password,
            seed: SeedStorage::Sealed(sealed_seed),
        }
    }

    /// Encrypt a master seed under a second password, with a fresh salt
    pub fn seal_seed(
        guid: &str,
        master: &MasterKey,
        second_password: &str,
        params: SealParams,
    ) -> Result<SealedSeed, CredentialsError> {
        let mut salt = [0u8; SEAL_SALT_LEN];
        getrandom::getrandom(&mut salt)?;

        let ciphertext =
            sealing_key(guid, second_password, &salt, &params)?.encrypt(master.as_bytes())?;
        Ok(SealedSeed {
            salt,
            params,
            ciphertext,
        })
    }

    pub fn sealed_seed(&self) -> Option<&SealedSeed> {
        match &self.seed {
            SeedStorage::Sealed(sealed) => Some(sealed),
            SeedStorage::Plain(_) => None,
        }
    }
}

/// Argon2id over the length-prefixed guid followed by the second password
fn sealing_key(
    guid: &str,
    second_password: &str,
    salt: &[u8],
    params: &SealParams,
) -> Result<Secret, CredentialsError> {
    let argon2_params =
        argon2::Params::new(params.m_cost, params.t_cost, params.p_cost, Some(SECRET_SIZE))
            .map_err(|e| CredentialsError::Kdf(e.to_string()))?;
    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut input = Zeroizing::new(Vec::with_capacity(8 + guid.len() + second_password.len()));
    input.extend_from_slice(&(guid.len() as u64).to_le_bytes());
    input.extend_from_slice(guid.as_bytes());
    input.extend_from_slice(second_password.as_bytes());

    let mut output = [0u8; SECRET_SIZE];
    argon2
        .hash_password_into(&input, salt, &mut output)
        .map_err(|e| CredentialsError::Kdf(e.to_string()))?;
    let key = Secret::from(output);
    output.zeroize();
    Ok(key)
}

impl WalletCredentials for LocalWallet {
    fn guid(&self) -> &str {
        &self.guid
    }

    fn shared_key(&self) -> &str {
        &self.shared_key
    }

    fn password(&self) -> &str {
        &self.password
    }

    fn is_double_encrypted(&self) -> bool {
        matches!(self.seed, SeedStorage::Sealed(_))
    }

    fn master_key(&self, second_password: Option<&str>) -> Result<MasterKey, CredentialsError> {
        match &self.seed {
            SeedStorage::Plain(master) => Ok(MasterKey::new(master.as_bytes().to_vec())?),
            SeedStorage::Sealed(sealed) => {
                let second_password =
                    second_password.ok_or(CredentialsError::SecondPasswordRequired)?;
                let seed = sealing_key(&self.guid, second_password, &sealed.salt, &sealed.params)?
                    .decrypt(&sealed.ciphertext)
                    .map_err(|_| CredentialsError::InvalidSecondPassword)?;
                Ok(MasterKey::new(seed)?)
            }
        }
    }
}
