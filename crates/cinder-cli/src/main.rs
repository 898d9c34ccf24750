//! Cinder command-line binary.
//!
//! # Usage
//!
//! ```bash
//! # Publish a message from stdin, encrypted, gone after ten minutes
//! echo "meet at 6" | cinder write --passphrase hunter2 --expires 10m
//!
//! # Publish a file
//! cinder write report.pdf --content-type application/pdf
//!
//! # Read once; the paste is deleted as soon as it is shown
//! cinder read http://localhost:8080/read/<handle>
//! ```

use std::{io::Write, process::ExitCode};

use cinder_cli::Cli;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // stdout carries paste content and links
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cinder_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            let _ = writeln!(std::io::stderr(), "cinder: {err}");
            ExitCode::FAILURE
        },
    }
}
