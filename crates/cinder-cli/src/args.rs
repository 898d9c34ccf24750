//! Command-line arguments.

use std::path::PathBuf;

use cinder_app::{AppConfig, DEFAULT_ORIGIN};
use cinder_core::Expiration;
use clap::{Args, Parser, Subcommand};

/// Burn-after-reading pastes
#[derive(Parser, Debug)]
#[command(name = "cinder")]
#[command(about = "Burn-after-reading pastes")]
#[command(version)]
pub struct Cli {
    /// Paste database
    #[arg(long, env = "CINDER_DB", default_value = "cinder.redb", global = true)]
    pub db: PathBuf,

    /// Origin used in share links
    #[arg(long, env = "CINDER_ORIGIN", default_value = DEFAULT_ORIGIN, global = true)]
    pub origin: String,

    /// Demo restrictions: writes need a passphrase and live at most a day
    #[arg(long, global = true)]
    pub demo: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Operation
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Application configuration for these arguments.
    pub fn app_config(&self) -> AppConfig {
        let config = if self.demo { AppConfig::demo() } else { AppConfig::default() };
        config.with_origin(self.origin.clone())
    }
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a message or file and print its link
    Write(WriteArgs),
    /// Read a paste once, then burn it
    Read(ReadArgs),
    /// Wrap content in an envelope without storing it
    Seal(SealArgs),
    /// Unwrap an envelope produced by `seal`
    Open(OpenArgs),
    /// Reclaim space held by expired pastes
    Purge,
}

/// Arguments for `write`.
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// File to publish; a message is read from stdin when absent
    pub file: Option<PathBuf>,

    /// Title (defaults to the file name)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Content type (defaults to text/plain for messages)
    #[arg(short, long)]
    pub content_type: Option<String>,

    /// Encrypt with this passphrase
    #[arg(short, long, env = "CINDER_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Lifetime: 10m, 6h, 1d, 3d or 1w
    #[arg(short, long, default_value = "1d")]
    pub expires: Expiration,

    /// Confirm large encrypted uploads without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Upload attempts before giving up
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,
}

/// Arguments for `read`.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Share link or bare handle
    pub link: String,

    /// Passphrase to try before asking
    #[arg(short, long, env = "CINDER_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Reveal without asking; this deletes the paste
    #[arg(short, long)]
    pub yes: bool,

    /// Burn as soon as the content is shown
    #[arg(short, long)]
    pub burn: bool,

    /// Save files here instead of under their download name
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `seal`.
#[derive(Args, Debug)]
pub struct SealArgs {
    /// Input file; stdin when absent
    pub file: Option<PathBuf>,

    /// Title framed with the content
    #[arg(short, long, default_value = "")]
    pub title: String,

    /// Encrypt with this passphrase
    #[arg(short, long, env = "CINDER_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,
}

/// Arguments for `open`.
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Envelope file; stdin when absent
    pub file: Option<PathBuf>,

    /// Passphrase for encrypted envelopes
    #[arg(short, long, env = "CINDER_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,
}
