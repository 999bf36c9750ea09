use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use common::events::MetadataEvents;
use common::interactor::MetadataInteractor;
use common::remote::CachedRemoteStore;
use common::repository::{MetadataRepository, RepositoryError};

use crate::client::{HttpRemoteStore, HttpStoreError};
use crate::state::{AppState, StateError};

pub const DEFAULT_REMOTE: &str = "http://localhost:3000";

pub type Store = CachedRemoteStore<HttpRemoteStore>;

/// Resolve the metadata service URL.
///
/// Priority: explicit `--remote` flag > config file `remote` > localhost default.
pub fn resolve_remote(explicit: Option<Url>, state: Option<&AppState>) -> Result<Url, url::ParseError> {
    if let Some(url) = explicit {
        return Ok(url);
    }
    if let Some(url) = state.and_then(|s| s.config.remote.clone()) {
        return Ok(url);
    }
    Url::parse(DEFAULT_REMOTE)
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("wallet password required (--password or METAVAULT_PASSWORD)")]
    MissingPassword,
    #[error(transparent)]
    Client(#[from] HttpStoreError),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A loaded state directory wired to the remote metadata service
pub struct Session {
    pub state: AppState,
    pub repository: MetadataRepository<Store>,
}

#[derive(Clone)]
pub struct OpContext {
    pub remote: Option<Url>,
    /// Optional custom state path (defaults to ~/.metavault)
    pub config_path: Option<PathBuf>,
    pub password: Option<String>,
    pub second_password: Option<String>,
}

impl OpContext {
    /// Load state and open a repository against the resolved remote.
    ///
    /// With a second password the registry is unlocked up front.
    pub async fn session(&self) -> Result<Session, SessionError> {
        let state = AppState::load(self.config_path.clone())?;
        let password = self.password.clone().ok_or(SessionError::MissingPassword)?;
        let credentials = state.wallet.credentials(password)?;

        let remote = resolve_remote(self.remote.clone(), Some(&state))?;
        tracing::debug!(%remote, "opening metadata session");
        let store = CachedRemoteStore::new(
            HttpRemoteStore::new(&remote)?,
            state.config.metadata.cache_policy(),
        );
        let interactor =
            MetadataInteractor::new(store, state.config.metadata.clone(), MetadataEvents::new());
        let repository = MetadataRepository::new(interactor, Arc::new(credentials));

        if let Some(second_password) = &self.second_password {
            repository.unlock(second_password).await?;
        }

        Ok(Session { state, repository })
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppConfig, WalletFile};
    use common::credentials::MasterKey;

    fn state_with_remote(remote: Option<&str>) -> (tempfile::TempDir, AppState) {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            remote: remote.map(|r| Url::parse(r).unwrap()),
            ..Default::default()
        };
        let master = MasterKey::new(vec![1u8; 16]).unwrap();
        let wallet = WalletFile::plain("g".into(), "s".into(), &master);
        let state = AppState::init(Some(tmp.path().join("state")), config, wallet).unwrap();
        (tmp, state)
    }

    #[test]
    fn test_resolve_remote_explicit_wins() {
        let (_tmp, state) = state_with_remote(Some("https://configured.example.com"));
        let explicit = Url::parse("http://example.com:9999").unwrap();
        let result = resolve_remote(Some(explicit.clone()), Some(&state)).unwrap();
        assert_eq!(result, explicit);
    }

    #[test]
    fn test_resolve_remote_uses_config() {
        let (_tmp, state) = state_with_remote(Some("https://configured.example.com"));
        let result = resolve_remote(None, Some(&state)).unwrap();
        assert_eq!(result.host_str(), Some("configured.example.com"));
    }

    #[test]
    fn test_resolve_remote_falls_back_to_default() {
        let (_tmp, state) = state_with_remote(None);
        assert_eq!(
            resolve_remote(None, Some(&state)).unwrap().as_str(),
            "http://localhost:3000/"
        );
        assert_eq!(resolve_remote(None, None).unwrap().port(), Some(3000));
    }

    #[tokio::test]
    async fn test_session_requires_password() {
        let (tmp, _state) = state_with_remote(None);
        let ctx = OpContext {
            remote: None,
            config_path: Some(tmp.path().join("state")),
            password: None,
            second_password: None,
        };
        assert!(matches!(
            ctx.session().await,
            Err(SessionError::MissingPassword)
        ));
    }
}
