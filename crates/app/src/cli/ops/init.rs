use clap::Args;

use common::config::MetadataConfig;
use common::credentials::{MasterKey, SealParams};
use common::crypto::derivation::DerivationError;

use crate::state::{AppConfig, AppState, WalletFile};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Wallet identifier (random if omitted)
    #[arg(long)]
    pub guid: Option<String>,

    /// Wallet shared key (random if omitted)
    #[arg(long)]
    pub shared_key: Option<String>,

    /// Hex master seed, 16 to 64 bytes (random if omitted)
    #[arg(long)]
    pub seed: Option<String>,

    /// Extra PUT attempts when the service answers not found
    #[arg(long)]
    pub put_retry_limit: Option<usize>,

    /// Cache GET results for this many seconds
    #[arg(long)]
    pub cache_max_age_secs: Option<u64>,

    /// Argon2id memory in KiB for sealing the seed under a second password
    #[arg(long, default_value_t = SealParams::default().m_cost)]
    pub kdf_memory_kib: u32,

    /// Argon2id passes for sealing the seed under a second password
    #[arg(long, default_value_t = SealParams::default().t_cost)]
    pub kdf_iterations: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
    #[error("invalid seed hex: {0}")]
    SeedHex(#[from] hex::FromHexError),
    #[error("invalid seed: {0}")]
    Seed(#[from] DerivationError),
    #[error("failed to generate seed: {0}")]
    Rng(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let master = match &self.seed {
            Some(seed) => MasterKey::new(hex::decode(seed)?)?,
            None => MasterKey::generate().map_err(|e| InitError::Rng(e.to_string()))?,
        };

        let guid = self
            .guid
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let shared_key = self
            .shared_key
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let wallet = match ctx.second_password.as_deref() {
            Some(second_password) => {
                let params = SealParams {
                    m_cost: self.kdf_memory_kib,
                    t_cost: self.kdf_iterations,
                    ..SealParams::default()
                };
                WalletFile::sealed(guid, shared_key, &master, second_password, params)?
            }
            None => WalletFile::plain(guid, shared_key, &master),
        };

        let defaults = MetadataConfig::default();
        let config = AppConfig {
            remote: ctx.remote.clone(),
            metadata: MetadataConfig {
                put_retry_limit: self.put_retry_limit.unwrap_or(defaults.put_retry_limit),
                cache_max_age_secs: self.cache_max_age_secs,
            },
            ..Default::default()
        };

        let state = AppState::init(ctx.config_path.clone(), config, wallet)?;

        let remote = match &state.config.remote {
            Some(url) => url.to_string(),
            None => format!("{} (default)", crate::cli::op::DEFAULT_REMOTE),
        };

        let output = format!(
            "Initialized metavault directory at: {}\n\
             - Config: {}\n\
             - Wallet: {}\n\
             - Wallet guid: {}\n\
             - Double encrypted: {}\n\
             - Remote: {}",
            state.dir.display(),
            state.config_path.display(),
            state.wallet_path.display(),
            state.wallet.guid,
            state.wallet.is_double_encrypted(),
            remote
        );

        Ok(output)
    }
}
