//! Paste store contract.
//!
//! The store sees only opaque envelopes and content-type labels. It never
//! learns a passphrase or plaintext.

use std::future::Future;

use thiserror::Error;

use crate::{Handle, Paste};

/// Errors returned by a [`PasteStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend I/O failure. Retryable.
    #[error("store I/O error: {0}")]
    Io(String),

    /// `create` was given a zero-length envelope.
    #[error("body required")]
    EmptyEnvelope,

    /// Stored record could not be decoded.
    #[error("corrupt record for {handle}: {reason}")]
    Corrupt {
        /// Handle of the damaged record.
        handle: Handle,
        /// Decoder message.
        reason: String,
    },
}

/// Storage collaborator for pastes.
///
/// Must be Clone (shared by runtimes and spawned tasks), Send + Sync, and
/// cheap to clone. Implementations share state internally, so clones see the
/// same pastes.
///
/// Futures returned here may be dropped before completion when a read is
/// cancelled; implementations must leave the store consistent if that happens.
pub trait PasteStore: Clone + Send + Sync + 'static {
    /// Store a paste until `expires_at` (Unix seconds) and issue its handle.
    ///
    /// # Errors
    ///
    /// - `StoreError::EmptyEnvelope` if the paste has no bytes
    fn create(
        &self,
        paste: Paste,
        expires_at: u64,
    ) -> impl Future<Output = Result<Handle, StoreError>> + Send;

    /// Fetch a paste.
    ///
    /// Returns `None` if the handle is unknown, was deleted, or has reached
    /// its expiry.
    fn fetch(&self, handle: &Handle)
    -> impl Future<Output = Result<Option<Paste>, StoreError>> + Send;

    /// Delete a paste.
    ///
    /// Idempotent: deleting an unknown handle succeeds.
    fn delete(&self, handle: &Handle) -> impl Future<Output = Result<(), StoreError>> + Send;
}
