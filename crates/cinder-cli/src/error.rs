//! CLI errors.

use std::io;

use cinder_app::{RuntimeError, user_message};
use cinder_core::{PasteError, StoreError};
use thiserror::Error;

use crate::TerminalError;

/// Errors reported by `cinder`.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The paste database could not be opened or purged.
    #[error("storage: {0}")]
    Store(#[from] StoreError),

    /// Neither a share link nor a handle.
    #[error("not a share link: {0}")]
    InvalidLink(String),

    /// Paste could not be read.
    #[error("{}", user_message(.0))]
    Paste(#[from] PasteError),

    /// A read or write runtime stopped.
    #[error(transparent)]
    Runtime(#[from] RuntimeError<TerminalError>),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
