//! The stored paste entity.

use bytes::Bytes;
use cinder_crypto::{Passphrase, open, probe_encrypted, verify_password};
use cinder_proto::{FramedContent, decode};
use zeroize::Zeroizing;

use crate::PasteError;

/// A content-type label coupled with an opaque envelope.
///
/// Immutable once built. Encrypted-ness is probed once at construction.
/// Clones share the envelope buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paste {
    content_type: String,
    envelope: Bytes,
    encrypted: bool,
}

impl Paste {
    /// Couple a content type with an envelope produced by
    /// [`cinder_crypto::seal`].
    pub fn new(content_type: impl Into<String>, envelope: impl Into<Bytes>) -> Self {
        let envelope = envelope.into();
        let encrypted = probe_encrypted(&envelope);
        Self { content_type: content_type.into(), envelope, encrypted }
    }

    /// MIME type label chosen by the writer. Never interpreted by stores.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Raw envelope bytes.
    pub fn envelope(&self) -> &Bytes {
        &self.envelope
    }

    /// Envelope size in bytes.
    pub fn len(&self) -> usize {
        self.envelope.len()
    }

    /// Returns true for a zero-length envelope.
    pub fn is_empty(&self) -> bool {
        self.envelope.is_empty()
    }

    /// Returns true if a passphrase is needed to read the content.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Cheap passphrase check against the verification marker. No key
    /// derivation.
    ///
    /// Always false for unencrypted pastes.
    pub fn check_password(&self, passphrase: &Passphrase) -> bool {
        self.encrypted && verify_password(&self.envelope, passphrase)
    }

    /// Open the envelope and decode the frame.
    ///
    /// Runs PBKDF2 for encrypted pastes; call it off the async executor.
    ///
    /// # Errors
    ///
    /// - `PasteError::PasswordRequired` if encrypted and `passphrase` is absent
    /// - `PasteError::WrongPassword` if the passphrase does not match
    /// - `PasteError::MalformedFraming` if the envelope or frame is truncated
    pub fn decrypted(&self, passphrase: Option<&Passphrase>) -> Result<FramedContent, PasteError> {
        let framed = Zeroizing::new(open(&self.envelope, passphrase)?);
        Ok(decode(&framed)?)
    }

    /// Split into `(content_type, envelope)`.
    pub fn into_parts(self) -> (String, Bytes) {
        (self.content_type, self.envelope)
    }
}
