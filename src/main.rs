//! Evidentia - Main Entry Point

use clap::Parser;
use evidentia::cli::{dispatch, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evidentia=info".into()),
        )
        .init();

    let cli = Cli::parse();
    dispatch(cli)
}
