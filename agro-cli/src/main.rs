//! Binary crate for the `agro` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments into form fields
//! - Interactive configuration
//! - A terminal [`agro_core::Page`] for the shared form handlers

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod terminal;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}

/// Logs are silent unless `--verbose` or `RUST_LOG` asks for them.
fn init_tracing(verbose: bool) {
    let default = if verbose { "agro_cli=debug,agro_core=debug" } else { "off" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
