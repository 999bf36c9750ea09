use std::{fs, path::PathBuf};

use common::config::MetadataConfig;
use common::credentials::{
    CredentialsError, LocalWallet, MasterKey, SealParams, SealedSeed, SEAL_SALT_LEN,
};
use common::crypto::derivation::DerivationError;
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "metavault";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const WALLET_FILE_NAME: &str = "wallet.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Metadata service base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<Url>,
    /// Default log level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: None,
            log_level: default_log_level(),
            metadata: MetadataConfig::default(),
        }
    }
}

/// Wallet identity as stored on disk
///
/// Exactly one of `seed` and `sealed_seed` is set. A sealed seed marks the
/// wallet as double encrypted. The login password is never written here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletFile {
    pub guid: String,
    pub shared_key: String,
    /// Hex master seed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    /// Master seed sealed under the second password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sealed_seed: Option<SealedSeedFile>,
}

/// On-disk form of a [`SealedSeed`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedSeedFile {
    /// Hex Argon2id salt
    pub salt: String,
    /// Hex `nonce || ciphertext || tag`
    pub ciphertext: String,
    pub kdf: SealParams,
}

impl From<&SealedSeed> for SealedSeedFile {
    fn from(sealed: &SealedSeed) -> Self {
        Self {
            salt: hex::encode(sealed.salt),
            ciphertext: hex::encode(&sealed.ciphertext),
            kdf: sealed.params,
        }
    }
}

impl SealedSeedFile {
    fn decode(&self) -> Result<SealedSeed, StateError> {
        let mut salt = [0u8; SEAL_SALT_LEN];
        hex::decode_to_slice(&self.salt, &mut salt)
            .map_err(|e| StateError::InvalidWallet(format!("salt: {}", e)))?;
        let ciphertext = hex::decode(&self.ciphertext)
            .map_err(|e| StateError::InvalidWallet(format!("sealed seed: {}", e)))?;
        Ok(SealedSeed {
            salt,
            params: self.kdf,
            ciphertext,
        })
    }
}

impl WalletFile {
    /// Wallet with its seed in the clear
    pub fn plain(guid: String, shared_key: String, master: &MasterKey) -> Self {
        Self {
            guid,
            shared_key,
            seed: Some(hex::encode(master.as_bytes())),
            sealed_seed: None,
        }
    }

    /// Double-encrypted wallet, seed sealed under `second_password`
    pub fn sealed(
        guid: String,
        shared_key: String,
        master: &MasterKey,
        second_password: &str,
        params: SealParams,
    ) -> Result<Self, StateError> {
        let sealed = LocalWallet::seal_seed(&guid, master, second_password, params)?;
        Ok(Self {
            guid,
            shared_key,
            seed: None,
            sealed_seed: Some(SealedSeedFile::from(&sealed)),
        })
    }

    pub fn is_double_encrypted(&self) -> bool {
        self.sealed_seed.is_some()
    }

    /// Build in-process credentials for this wallet
    pub fn credentials(&self, password: String) -> Result<LocalWallet, StateError> {
        match (&self.seed, &self.sealed_seed) {
            (Some(seed), None) => {
                let seed = hex::decode(seed).map_err(|e| StateError::InvalidWallet(e.to_string()))?;
                let master = MasterKey::new(seed)?;
                Ok(LocalWallet::new(
                    self.guid.clone(),
                    self.shared_key.clone(),
                    password,
                    master,
                ))
            }
            (None, Some(sealed)) => Ok(LocalWallet::sealed(
                self.guid.clone(),
                self.shared_key.clone(),
                password,
                sealed.decode()?,
            )),
            _ => Err(StateError::InvalidWallet(
                "exactly one of seed and sealed_seed must be set".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.metavault)
    pub dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Path to the wallet file
    pub wallet_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
    /// Loaded wallet identity
    pub wallet: WalletFile,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.metavault)
    pub fn dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: AppConfig,
        wallet: WalletFile,
    ) -> Result<Self, StateError> {
        let dir = Self::dir(custom_path)?;

        if dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;

        let config_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        let wallet_path = dir.join(WALLET_FILE_NAME);
        fs::write(&wallet_path, toml::to_string_pretty(&wallet)?)?;

        Ok(Self {
            dir,
            config_path,
            wallet_path,
            config,
            wallet,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let dir = Self::dir(custom_path)?;

        if !dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = dir.join(CONFIG_FILE_NAME);
        let wallet_path = dir.join(WALLET_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        if !wallet_path.exists() {
            return Err(StateError::MissingFile(WALLET_FILE_NAME.to_string()));
        }

        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;
        let wallet: WalletFile = toml::from_str(&fs::read_to_string(&wallet_path)?)?;

        Ok(Self {
            dir,
            config_path,
            wallet_path,
            config,
            wallet,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("metavault directory not initialized. Run 'metavault init' first")]
    NotInitialized,

    #[error("metavault directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid wallet file: {0}")]
    InvalidWallet(String),

    #[error("invalid master seed: {0}")]
    Seed(#[from] DerivationError),

    #[error("wallet error: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
