//! plmirror - Keep a resumable, position-ordered local mirror of a playlist

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod error;
mod library;
mod mirror;
mod remote;
mod utils;

#[cfg(test)]
mod testing;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        cli::commands::completion(shell);
        return Ok(());
    }

    // Initialize logging
    let filter = if cli.verbose {
        "plmirror=debug"
    } else {
        "plmirror=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let playlist = cli
        .playlist
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No playlist given"))?;

    cli::commands::mirror(&cli, &playlist).await
}
