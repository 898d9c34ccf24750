//! Cinder command-line interface.
//!
//! Runs the production read and write runtimes against a [`RedbStore`] with
//! terminal drivers: prompts and status go to stderr, content and links to
//! stdout, so output can be piped.
//!
//! [`RedbStore`]: cinder_store::RedbStore

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod args;
mod commands;
mod error;
mod terminal;

pub use args::{Cli, Command, OpenArgs, ReadArgs, SealArgs, WriteArgs};
pub use commands::{open_envelope, publish, read, run, seal_content};
pub use error::CliError;
pub use terminal::{Prompt, TerminalError, TerminalReader, TerminalWriter, prompt_for, status_line};
