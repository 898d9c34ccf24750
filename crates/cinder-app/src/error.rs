//! Write and runtime errors, and reader-facing error text.

use cinder_core::{Expiration, PasteError, readable_bytes};
use thiserror::Error;

/// Reasons a write did not produce a link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// Demo mode only accepts encrypted pastes.
    #[error("a passphrase is required on this instance")]
    EncryptionRequired,

    /// Demo mode caps the lifetime at one day.
    #[error("expiration of {0} is not available on this instance")]
    ExpirationNotAllowed(Expiration),

    /// Nothing to upload.
    #[error("body required")]
    EmptyBody,

    /// Size ceiling or storage failure.
    #[error(transparent)]
    Paste(#[from] PasteError),

    /// Writer declined or gave up.
    #[error("write cancelled")]
    Cancelled,
}

/// Errors that stop a runtime.
#[derive(Error, Debug)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// Driver failed (input or rendering).
    #[error("driver error: {0}")]
    Driver(#[source] E),

    /// Write flow ended without a link.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Write flow stopped in a non-terminal state with nothing to do.
    #[error("write flow stalled while {0}")]
    Stalled(&'static str),
}

/// Text to show a reader for a read error.
///
/// Cryptographic failures stay opaque: only the wrong-passphrase signal is
/// distinguishable, and storage detail is never shown.
pub fn user_message(err: &PasteError) -> String {
    match err {
        PasteError::WrongPassword => "Wrong passphrase.".to_owned(),
        PasteError::PasswordRequired => "This paste needs a passphrase.".to_owned(),
        PasteError::MalformedFraming => "Unable to open this paste.".to_owned(),
        PasteError::NotFound => "This paste was already burned or has expired.".to_owned(),
        PasteError::Storage(_) => "Storage is unreachable right now. Try again.".to_owned(),
        PasteError::SizeExceeded { size, limit } => {
            format!("Content is {}, the limit is {}.", readable_bytes(*size), readable_bytes(*limit))
        },
    }
}

#[cfg(test)]
mod tests {
    use cinder_core::StoreError;

    use super::*;

    #[test]
    fn storage_detail_is_hidden() {
        let err = PasteError::Storage(StoreError::Io("disk /var/lib/cinder full".into()));
        assert!(!user_message(&err).contains("/var/lib"));
    }

    #[test]
    fn size_message_is_readable() {
        let err = PasteError::SizeExceeded { size: 60 << 20, limit: 50 << 20 };
        assert_eq!(user_message(&err), "Content is 60.00 MiB, the limit is 50.00 MiB.");
    }

    #[test]
    fn write_error_wraps_paste_error() {
        let err = WriteError::from(PasteError::SizeExceeded { size: 2, limit: 1 });
        assert_eq!(err.to_string(), "content is 2 bytes, limit is 1");
        assert_eq!(
            WriteError::ExpirationNotAllowed(Expiration::OneWeek).to_string(),
            "expiration of 1 week is not available on this instance"
        );
    }
}
