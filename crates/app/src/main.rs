// CLI modules
mod cli;
mod client;
mod state;

use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use cli::{args::Args, op::Op, Get, Init, Nodes, Put, Version};

command_enum! {
    (Get, Get),
    (Init, Init),
    (Nodes, Nodes),
    (Put, Put),
    (Version, Version),
}

/// Install the stderr logger. Stdout is reserved for command output.
fn init_logging(log_level: LevelFilter) -> tracing_appender::non_blocking::WorkerGuard {
    let (stderr_writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stderr_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();

    guard
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Log level comes from the state directory when there is one
    let log_level = state::AppState::load(args.config_path.clone())
        .ok()
        .and_then(|state| LevelFilter::from_str(&state.config.log_level).ok())
        .unwrap_or(LevelFilter::WARN);
    let guard = init_logging(log_level);

    let ctx = cli::op::OpContext {
        remote: args.remote,
        config_path: args.config_path,
        password: args.password,
        second_password: args.second_password,
    };

    let result = args.command.execute(&ctx).await;
    // flush buffered log lines before exiting
    drop(guard);

    match result {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
