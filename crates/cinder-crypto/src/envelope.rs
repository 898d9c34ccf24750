//! Sealing and opening paste envelopes.
//!
//! All functions are pure. The IV is supplied by the caller; production code
//! draws it from a CSPRNG, tests pin it.

use sha2::{Digest, Sha256};

use crate::{EnvelopeError, Passphrase, cipher, kdf::derive_key};

/// Length of the verification marker prefix.
pub const MARKER_LEN: usize = 32;

/// Length of the AES-CTR initial counter block.
pub const IV_LEN: usize = 16;

/// Length of the fixed prefix of an encrypted envelope (marker + IV).
pub const HEADER_LEN: usize = MARKER_LEN + IV_LEN;

/// Marker carried by every unencrypted envelope.
pub const UNENCRYPTED_MARKER: [u8; MARKER_LEN] = [0u8; MARKER_LEN];

/// SHA-256 of the passphrase's UTF-8 bytes, used as the verification marker.
pub fn password_hash(passphrase: &Passphrase) -> [u8; MARKER_LEN] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Returns true if the envelope is encrypted.
///
/// An envelope is encrypted when any of its first [`MARKER_LEN`] bytes is
/// nonzero. Inspects at most those bytes; shorter inputs are probed as far as
/// they go.
pub fn probe_encrypted(envelope: &[u8]) -> bool {
    envelope.iter().take(MARKER_LEN).any(|&b| b != 0)
}

/// Returns true if `passphrase` matches the envelope's verification marker.
///
/// Cheap: one SHA-256, no key derivation. Returns false for envelopes too
/// short to hold a marker and for unencrypted envelopes, whose all-zero marker
/// no passphrase hashes to.
pub fn verify_password(envelope: &[u8], passphrase: &Passphrase) -> bool {
    let Some(marker) = envelope.get(..MARKER_LEN) else {
        return false;
    };
    password_hash(passphrase) == marker
}

/// Wrap framed content in an envelope.
///
/// With a non-empty passphrase the content is encrypted under a key derived
/// from it, and the output is `48 + framed.len()` bytes. Without one (or with
/// the empty passphrase) the output is 32 zero bytes followed by `framed`
/// verbatim, and `iv` is unused.
///
/// Never fails.
pub fn seal(framed: &[u8], passphrase: Option<&Passphrase>, iv: [u8; IV_LEN]) -> Vec<u8> {
    let Some(passphrase) = passphrase.filter(|p| !p.is_empty()) else {
        let mut envelope = Vec::with_capacity(MARKER_LEN + framed.len());
        envelope.extend_from_slice(&UNENCRYPTED_MARKER);
        envelope.extend_from_slice(framed);
        return envelope;
    };

    let key = derive_key(passphrase);

    let mut envelope = Vec::with_capacity(HEADER_LEN + framed.len());
    envelope.extend_from_slice(&password_hash(passphrase));
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(framed);
    cipher::apply_keystream(&key, &iv, &mut envelope[HEADER_LEN..]);

    envelope
}

/// Recover framed content from an envelope.
///
/// Unencrypted envelopes yield the bytes after the marker and ignore any
/// passphrase. Encrypted envelopes check the marker before deriving the key,
/// so a wrong passphrase is rejected without paying for PBKDF2.
///
/// # Errors
///
/// - `EnvelopeError::Truncated` if the envelope is shorter than its fixed
///   prefix ([`MARKER_LEN`] bytes, or [`HEADER_LEN`] bytes when encrypted)
/// - `EnvelopeError::PasswordRequired` if the envelope is encrypted and no
///   non-empty passphrase was given
/// - `EnvelopeError::WrongPassword` if the passphrase does not match the marker
pub fn open(envelope: &[u8], passphrase: Option<&Passphrase>) -> Result<Vec<u8>, EnvelopeError> {
    if envelope.len() < MARKER_LEN {
        return Err(EnvelopeError::Truncated { required: MARKER_LEN, actual: envelope.len() });
    }

    if !probe_encrypted(envelope) {
        return Ok(envelope[MARKER_LEN..].to_vec());
    }

    if envelope.len() < HEADER_LEN {
        return Err(EnvelopeError::Truncated { required: HEADER_LEN, actual: envelope.len() });
    }

    let passphrase =
        passphrase.filter(|p| !p.is_empty()).ok_or(EnvelopeError::PasswordRequired)?;

    if !verify_password(envelope, passphrase) {
        return Err(EnvelopeError::WrongPassword);
    }

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&envelope[MARKER_LEN..HEADER_LEN]);

    let key = derive_key(passphrase);
    let mut framed = envelope[HEADER_LEN..].to_vec();
    cipher::apply_keystream(&key, &iv, &mut framed);

    Ok(framed)
}
