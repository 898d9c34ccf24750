//! Cinder content framing
//!
//! Every paste carries a title next to its body: a file name for uploaded
//! files, an empty string for hand-written messages. Both travel inside the
//! envelope plaintext as a single byte sequence:
//!
//! ```text
//! ┌──────────────┬─────────────────────┬──────────────────┐
//! │ TitleLen (1) │ Title (TitleLen, B) │ Body (remaining) │
//! └──────────────┴─────────────────────┴──────────────────┘
//! ```
//!
//! The encoder silently truncates titles to [`MAX_TITLE_LEN`] bytes. The
//! decoder never second-guesses the length byte.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
mod framing;

pub use errors::{FramingError, Result};
pub use framing::{FramedContent, MAX_TITLE_LEN, decode, encode, encode_into};
