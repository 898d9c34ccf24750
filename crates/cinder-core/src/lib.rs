//! Cinder core types
//!
//! The pieces every other layer agrees on: the [`Paste`] entity, its
//! [`Handle`], the [`PasteStore`] collaborator contract, the unified
//! [`PasteError`] taxonomy, write-time [`SizeLimits`] and [`Expiration`]
//! presets, and the [`Environment`] abstraction over time and randomness.
//!
//! # Data Flow
//!
//! ```text
//! (title, body) ──encode──► framed ──seal──► envelope ──┐
//!                                                      ▼
//!                                   Paste { content_type, envelope }
//!                                                      │
//!                               PasteStore::create ────┴──► Handle
//!                                                              │
//! (title, body) ◄──decode── framed ◄──open── Paste ◄──fetch────┘
//! ```
//!
//! Nothing here performs I/O. Stores live in `cinder-store`, runtimes in
//! `cinder-app`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
mod error;
mod handle;
mod limits;
mod paste;
mod store;

pub use env::Environment;
pub use error::PasteError;
pub use handle::{HANDLE_LEN, Handle, READ_PATH};
pub use limits::{
    CAUTION_BYTES, Expiration, MAX_BYTES, SizeCheck, SizeLimits, UnknownExpiration,
    readable_bytes,
};
pub use paste::Paste;
pub use store::{PasteStore, StoreError};
