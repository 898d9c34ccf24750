//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must hold at every point of a read
//! session, whatever the interleaving of reader input and store completions.
//! They are checked against a [`SessionTrace`], the ordered list of snapshots
//! the session rendered, so both per-state and history properties are
//! expressible.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.check_all(&trace)?;
//! ```

mod checks;
mod trace;

pub use checks::{
    BurnedIsTerminal, DeleteNeverDuplicated, EnvelopeReleasedOnReveal, PlaintextOnlyWhileViewing,
    ValidTransitions, ViewingImpliesDelete,
};
pub use trace::SessionTrace;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property checked against a session trace.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the trace so far.
    fn check(&self, trace: &SessionTrace) -> InvariantResult;

    /// Build a violation for this invariant.
    fn violation(&self, message: String) -> Violation {
        Violation { invariant: self.name(), message }
    }
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Registry with the burn-after-reading invariants.
    ///
    /// Includes:
    /// - [`BurnedIsTerminal`]: nothing follows `Burned`
    /// - [`ValidTransitions`]: every state change is a lifecycle edge
    /// - [`PlaintextOnlyWhileViewing`]: plaintext is held only while viewing
    /// - [`ViewingImpliesDelete`]: viewing always has a delete issued
    /// - [`EnvelopeReleasedOnReveal`]: the envelope is dropped once revealed
    /// - [`DeleteNeverDuplicated`]: a new delete only follows a failed one
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(BurnedIsTerminal);
        registry.add(ValidTransitions);
        registry.add(PlaintextOnlyWhileViewing);
        registry.add(ViewingImpliesDelete);
        registry.add(EnvelopeReleasedOnReveal);
        registry.add(DeleteNeverDuplicated);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the trace.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, trace: &SessionTrace) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(trace).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    #[allow(clippy::panic, reason = "test assertion helper")]
    pub fn assert_all(&self, trace: &SessionTrace, context: &str) {
        if let Err(violations) = self.check_all(trace) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}\ntrace: {trace}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
