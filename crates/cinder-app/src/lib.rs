//! Application layer for Cinder
//!
//! Pure state machines for reading and writing pastes, plus generic runtimes
//! that execute their side effects, so simulation tests drive the same code
//! that runs in production.
//!
//! # Components
//!
//! - [`ReadSession`]: read lifecycle (fetch, unlock, reveal, delete, burn)
//! - [`WriteFlow`]: write lifecycle (validate, confirm, seal, upload, link)
//! - [`ReadDriver`] / [`WriteDriver`]: platform-specific input and rendering
//! - [`ReadRuntime`] / [`WriteRuntime`]: orchestration over a
//!   [`cinder_core::PasteStore`] and an [`cinder_core::Environment`]
//!
//! # Read Lifecycle
//!
//! ```text
//!            ┌──────── not found ────────────────────────┐
//!            │                                           ▼
//!  Loading ──┼── encrypted ──► Encrypted ──┐          Burned
//!            │                             ├─► Viewing ──┘
//!            └── plain ─────► NotEncrypted ┘   (burn)
//! ```
//!
//! Reaching `Viewing` issues the server-side delete in the same step. The
//! session never waits for it; a failure is kept as a warning.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod driver;
mod error;
mod event;
mod present;
mod read;
mod runtime;
mod state;
mod system_env;
mod write;

pub use action::{ReadAction, WriteAction};
pub use config::{AppConfig, DEFAULT_BURN_TRANSITION, DEFAULT_ORIGIN};
pub use driver::{ReadDriver, WriteDriver};
pub use error::{RuntimeError, WriteError, user_message};
pub use event::{ReadEvent, WriteEvent};
pub use present::{ContentKind, Presented, extension_for};
pub use read::ReadSession;
pub use runtime::{ReadRuntime, WriteRuntime};
pub use state::{Deletion, ReadSnapshot, ReadState, WriteState};
pub use system_env::SystemEnv;
pub use write::{WriteFlow, WriteRequest};
