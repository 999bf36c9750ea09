pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "metavault")]
#[command(about = "Read and write encrypted wallet metadata")]
pub struct Args {
    /// Metadata service base URL (defaults to the configured remote)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the metavault state directory (defaults to ~/.metavault)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Wallet login password
    #[arg(long, global = true, env = "METAVAULT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Wallet second password, needed once for double-encrypted wallets
    #[arg(
        long,
        global = true,
        env = "METAVAULT_SECOND_PASSWORD",
        hide_env_values = true
    )]
    pub second_password: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
