//! AES-256-CTR keystream application
//!
//! The 16-byte IV is the initial counter block. Only its low 64 bits are
//! incremented (big-endian, wrapping), which is how browser `AES-CTR` with a
//! 64-bit counter length behaves. Encryption and decryption are the same
//! operation.

use ctr::cipher::{KeyIvInit, StreamCipher};

use crate::{envelope::IV_LEN, kdf::EnvelopeKey};

type Aes256Ctr64 = ctr::Ctr64BE<aes::Aes256>;

/// XOR the keystream for `(key, iv)` into `buf` in place.
pub(crate) fn apply_keystream(key: &EnvelopeKey, iv: &[u8; IV_LEN], buf: &mut [u8]) {
    let Ok(mut cipher) = Aes256Ctr64::new_from_slices(key.as_bytes(), iv) else {
        unreachable!("key is 32 bytes and IV is 16 bytes");
    };
    cipher.apply_keystream(buf);
}
