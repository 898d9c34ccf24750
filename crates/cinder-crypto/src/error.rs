//! Envelope error types.

use thiserror::Error;

/// Errors that can occur while opening an envelope.
///
/// Sealing never fails. Opening distinguishes only what a reader can act on:
/// supply a passphrase, retry the passphrase, or give up on a damaged blob.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Envelope is encrypted and no passphrase was supplied.
    #[error("passphrase required")]
    PasswordRequired,

    /// Passphrase does not match the verification marker.
    #[error("wrong passphrase")]
    WrongPassword,

    /// Envelope is shorter than its fixed prefix.
    #[error("envelope truncated: need at least {required} bytes, got {actual}")]
    Truncated {
        /// Minimum length for this envelope kind.
        required: usize,
        /// Actual envelope length.
        actual: usize,
    },
}

impl EnvelopeError {
    /// Returns true if the reader can recover by supplying a (different)
    /// passphrase.
    ///
    /// A truncated envelope is damaged for good; no passphrase fixes it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PasswordRequired | Self::WrongPassword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passphrase_errors_are_recoverable() {
        assert!(EnvelopeError::PasswordRequired.is_recoverable());
        assert!(EnvelopeError::WrongPassword.is_recoverable());
    }

    #[test]
    fn truncation_is_fatal() {
        assert!(!EnvelopeError::Truncated { required: 48, actual: 40 }.is_recoverable());
    }
}
