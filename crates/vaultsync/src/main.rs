//! vaultsync CLI
//!
//! Command-line front end for the vaultsync engine: one-shot sync,
//! single-direction runs, command preview, interval watching, and
//! config scaffolding.

// CLI binary writes to stdout/stderr by design
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod ui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("warn")
        }))
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    cli.run().await
}
