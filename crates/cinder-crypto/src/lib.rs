//! Cinder Envelope Cryptography
//!
//! Wraps framed paste content in an optional passphrase envelope. Pure
//! functions with deterministic outputs; callers provide the IV so tests can
//! pin it.
//!
//! # Envelope Layout
//!
//! ```text
//! Unencrypted:
//! ┌───────────────────┬────────────────────────┐
//! │ 0x00 × 32         │ framed content         │
//! └───────────────────┴────────────────────────┘
//!
//! Encrypted:
//! ┌───────────────────┬──────────┬───────────────────────────────┐
//! │ SHA-256(pass) 32  │ IV (16)  │ AES-256-CTR(framed content)   │
//! └───────────────────┴──────────┴───────────────────────────────┘
//! ```
//!
//! # Key Derivation
//!
//! ```text
//! UTF-8 passphrase
//!        │
//!        ├──────────────► SHA-256 ──► verification marker (bytes 0..32)
//!        │
//!        ▼
//! PBKDF2-HMAC-SHA256 (16 zero-byte salt, 100 000 rounds)
//!        │
//!        ▼
//! 256-bit key ──► AES-256-CTR, IV = initial counter block
//! ```
//!
//! # Security
//!
//! The format is fixed for interoperability and carries two deliberate
//! weaknesses:
//!
//! - The PBKDF2 salt is a public constant. Identical passphrases derive
//!   identical keys across pastes.
//! - The marker is an unsalted hash of the passphrase. It lets a reader reject
//!   a wrong passphrase without paying for key derivation, and it equally lets
//!   anyone holding the envelope test guesses at SHA-256 speed.
//!
//! There is no authentication tag: a tampered ciphertext decrypts to garbage
//! rather than failing. Content is single-read and short-lived, which is the
//! threat model these trade-offs were accepted under.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cipher;
mod envelope;
mod error;
mod kdf;
mod passphrase;

pub use envelope::{
    HEADER_LEN, IV_LEN, MARKER_LEN, UNENCRYPTED_MARKER, open, password_hash, probe_encrypted,
    seal, verify_password,
};
pub use error::EnvelopeError;
pub use kdf::{EnvelopeKey, KDF_ROUNDS, KDF_SALT, KEY_LEN, derive_key};
pub use passphrase::Passphrase;
