//! Driver traits abstracting input and rendering.
//!
//! The runtimes own all orchestration; a driver only turns user input into
//! events and draws state. The CLI and the simulation harness each implement
//! both traits, so the same runtime code runs in production and in tests.

use std::future::Future;

use cinder_core::StoreError;

use crate::{ReadEvent, ReadSession, WriteFlow};

/// Input and rendering for [`crate::ReadRuntime`].
pub trait ReadDriver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next reader input.
    ///
    /// Returns `None` once the reader has left. Only reader events are
    /// expected here (passphrase, reveal, burn, retries); completions come
    /// from the runtime itself.
    ///
    /// # Cancel Safety
    ///
    /// The runtime races this future against side-effect completions and
    /// drops it when a completion wins. Implementations must not lose input
    /// when dropped before completion.
    fn next_input(&mut self) -> impl Future<Output = Result<Option<ReadEvent>, Self::Error>> + Send;

    /// Draw the session.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, session: &ReadSession) -> Result<(), Self::Error>;
}

/// Prompts and rendering for [`crate::WriteRuntime`].
pub trait WriteDriver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Ask whether to go ahead with encrypting `size` bytes.
    fn confirm_large(&mut self, size: u64) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Ask whether to retry an upload that failed with `error`.
    fn retry_upload(
        &mut self,
        error: &StoreError,
        attempts: u32,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Draw the flow.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, flow: &WriteFlow) -> Result<(), Self::Error>;
}
