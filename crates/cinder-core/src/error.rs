//! Unified error taxonomy for reading and writing pastes.
//!
//! Lower layers keep their own precise errors ([`cinder_proto::FramingError`],
//! [`cinder_crypto::EnvelopeError`], [`StoreError`]). This type folds them
//! into the handful of outcomes a caller actually reacts to.

use cinder_crypto::EnvelopeError;
use cinder_proto::FramingError;
use thiserror::Error;

use crate::StoreError;

/// Errors surfaced while reading or writing a paste.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasteError {
    /// Envelope or frame is corrupt or truncated. Fatal for this attempt.
    #[error("paste content is malformed")]
    MalformedFraming,

    /// Paste is encrypted and no passphrase was supplied.
    #[error("passphrase required")]
    PasswordRequired,

    /// Passphrase did not match.
    #[error("wrong passphrase")]
    WrongPassword,

    /// Paste does not exist, has expired, or was already read.
    #[error("paste not found")]
    NotFound,

    /// Store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Content is larger than the write ceiling.
    #[error("content is {size} bytes, limit is {limit}")]
    SizeExceeded {
        /// Content size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },
}

impl PasteError {
    /// Returns true if the same operation may succeed if repeated, possibly
    /// with different input.
    ///
    /// Passphrase errors re-prompt, storage errors retry. Malformed content,
    /// missing pastes and oversized uploads will fail the same way again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PasswordRequired | Self::WrongPassword | Self::Storage(_))
    }
}

impl From<FramingError> for PasteError {
    fn from(_: FramingError) -> Self {
        Self::MalformedFraming
    }
}

impl From<EnvelopeError> for PasteError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::PasswordRequired => Self::PasswordRequired,
            EnvelopeError::WrongPassword => Self::WrongPassword,
            EnvelopeError::Truncated { .. } => Self::MalformedFraming,
        }
    }
}
