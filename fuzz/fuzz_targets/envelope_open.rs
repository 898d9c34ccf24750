//! Fuzz target for opening envelopes
//!
//! # Strategy
//!
//! - Raw envelopes: arbitrary bytes, with or without a passphrase
//! - Sealed envelopes: arbitrary content sealed without a passphrase must
//!   open back to the same content
//!
//! Key derivation only runs when the fuzzed passphrase matches the marker,
//! so the fuzzer stays fast on the common path.

#![no_main]

use arbitrary::Arbitrary;
use cinder_core::{Paste, PasteError};
use cinder_crypto::{IV_LEN, Passphrase, open, seal};
use cinder_proto::encode;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Input {
    Raw { envelope: Vec<u8>, passphrase: Option<String> },
    Sealed { title: String, body: Vec<u8>, iv: [u8; IV_LEN] },
}

fuzz_target!(|input: Input| {
    match input {
        Input::Raw { envelope, passphrase } => {
            let passphrase = passphrase.map(Passphrase::new);
            let _ = open(&envelope, passphrase.as_ref());

            let paste = Paste::new("application/octet-stream", envelope);
            if let Err(err) = paste.decrypted(passphrase.as_ref()) {
                assert!(
                    !matches!(err, PasteError::NotFound | PasteError::Storage(_)),
                    "decrypt reported {err:?}"
                );
            }
        },
        Input::Sealed { title, body, iv } => {
            let envelope = seal(&encode(&title, &body), None, iv);
            let paste = Paste::new("text/plain", envelope);
            assert!(!paste.is_encrypted());

            let Ok(content) = paste.decrypted(None) else {
                panic!("sealed envelope failed to open");
            };
            assert_eq!(content.body, body);
        },
    }
});
