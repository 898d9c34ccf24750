//! Deterministic simulation harness for Cinder.
//!
//! Simulated implementations of the driver and environment traits, so the
//! production [`cinder_app::ReadRuntime`] and [`cinder_app::WriteRuntime`]
//! run unchanged against an in-memory (optionally chaotic) store on tokio's
//! paused clock.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties of a whole read session: every
//! rendered [`cinder_app::ReadSnapshot`] is appended to a [`SessionTrace`] and
//! the registry runs over the trace. Use [`InvariantRegistry::standard()`]
//! for the burn-after-reading guarantees.
//!
//! # Replay
//!
//! [`replay`] feeds arbitrary [`ReaderOp`] sequences, stale completions
//! included, straight into a [`cinder_app::ReadSession`]. Property tests and
//! the fuzzer share it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod replay;
pub mod scenario;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    BurnedIsTerminal, DeleteNeverDuplicated, EnvelopeReleasedOnReveal, Invariant,
    InvariantRegistry, InvariantResult, PlaintextOnlyWhileViewing, SessionTrace,
    ValidTransitions, ViewingImpliesDelete, Violation,
};
pub use replay::{ReaderOp, replay};
pub use scenario::{ReadOutcome, World};
pub use sim_driver::{Seen, SimDriverError, SimReadDriver, SimWriteDriver, Step, WriteLog};
pub use sim_env::SimEnv;
