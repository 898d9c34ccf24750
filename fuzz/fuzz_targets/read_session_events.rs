//! Fuzz target for the read session state machine
//!
//! Arbitrary reader input and collaborator completions, stale and duplicate
//! ones included, are fed straight into a session. Every burn-after-reading
//! invariant must hold over the resulting trace.

#![no_main]

use cinder_harness::{InvariantRegistry, ReaderOp, replay};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|ops: Vec<ReaderOp>| {
    let (_, trace) = replay(&ops);

    if let Err(violations) = InvariantRegistry::standard().check_all(&trace) {
        panic!("invariant violations after {ops:?}: {violations:?}");
    }
});
