//! Passphrase key derivation using PBKDF2-HMAC-SHA256

use std::fmt;

use hmac::Hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::Passphrase;

/// PBKDF2 salt. Sixteen zero bytes, fixed by the envelope format.
pub const KDF_SALT: [u8; 16] = [0u8; 16];

/// PBKDF2 iteration count, fixed by the envelope format.
pub const KDF_ROUNDS: u32 = 100_000;

/// Derived key length (AES-256).
pub const KEY_LEN: usize = 32;

/// AES-256 key derived from a passphrase.
///
/// Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct EnvelopeKey([u8; KEY_LEN]);

impl EnvelopeKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EnvelopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnvelopeKey(***)")
    }
}

impl Drop for EnvelopeKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Derive the envelope key for a passphrase.
///
/// Deterministic: the salt is constant, so equal passphrases always yield
/// equal keys. This is the expensive step of opening an encrypted envelope;
/// runtimes should call it off the async executor.
pub fn derive_key(passphrase: &Passphrase) -> EnvelopeKey {
    derive_key_with_rounds(passphrase.as_bytes(), KDF_ROUNDS)
}

pub(crate) fn derive_key_with_rounds(password: &[u8], rounds: u32) -> EnvelopeKey {
    let mut key = [0u8; KEY_LEN];
    let Ok(()) = pbkdf2::pbkdf2::<Hmac<Sha256>>(password, &KDF_SALT, rounds, &mut key) else {
        unreachable!("HMAC-SHA256 accepts keys of any length");
    };
    EnvelopeKey(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        ::hex::decode(s).unwrap()
    }

    #[test]
    fn pbkdf2_hmac_sha256_known_answer() {
        // RFC 7914 §11, first 32 bytes of the c=1 vector
        let mut out = [0u8; 32];
        pbkdf2::pbkdf2::<Hmac<Sha256>>(b"passwd", b"salt", 1, &mut out).unwrap();
        assert_eq!(
            out.to_vec(),
            hex("55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc")
        );
    }

    #[test]
    fn derive_is_deterministic() {
        let a = derive_key_with_rounds(b"correct horse", 10);
        let b = derive_key_with_rounds(b"correct horse", 10);
        assert_eq!(a, b, "fixed salt means equal passphrases give equal keys");
    }

    #[test]
    fn different_passphrases_produce_different_keys() {
        let a = derive_key_with_rounds(b"alpha", 10);
        let b = derive_key_with_rounds(b"bravo", 10);
        assert_ne!(a, b);
    }

    #[test]
    fn round_count_matters() {
        let a = derive_key_with_rounds(b"alpha", 10);
        let b = derive_key_with_rounds(b"alpha", 11);
        assert_ne!(a, b);
    }

    #[test]
    fn full_round_count_matches_reference() {
        let mut expected = [0u8; 32];
        pbkdf2::pbkdf2::<Hmac<Sha256>>(b"hunter2", &[0u8; 16], 100_000, &mut expected).unwrap();

        let key = derive_key(&Passphrase::new("hunter2"));
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn debug_is_redacted() {
        let key = derive_key_with_rounds(b"x", 1);
        assert_eq!(format!("{key:?}"), "EnvelopeKey(***)");
    }
}
