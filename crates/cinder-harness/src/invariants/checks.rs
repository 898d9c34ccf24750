//! Standard invariant checks.

use cinder_app::ReadState;

use super::{Invariant, InvariantResult, SessionTrace};

/// Once `Burned`, always `Burned`.
pub struct BurnedIsTerminal;

impl Invariant for BurnedIsTerminal {
    fn name(&self) -> &'static str {
        "burned_is_terminal"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        let snapshots = trace.snapshots();
        let Some(burned_at) = snapshots.iter().position(|s| s.state == ReadState::Burned) else {
            return Ok(());
        };

        match snapshots[burned_at..].iter().find(|s| s.state != ReadState::Burned) {
            Some(after) => Err(self.violation(format!("left burned for {}", after.state))),
            None => Ok(()),
        }
    }
}

/// Consecutive snapshots differ only by a lifecycle edge.
pub struct ValidTransitions;

impl Invariant for ValidTransitions {
    fn name(&self) -> &'static str {
        "valid_transitions"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        for pair in trace.snapshots().windows(2) {
            let (from, to) = (pair[0].state, pair[1].state);
            if !from.can_transition_to(to) {
                return Err(self.violation(format!("{from} -> {to}")));
            }
        }
        Ok(())
    }
}

/// Plaintext is held only in `Viewing`; burning wipes it.
pub struct PlaintextOnlyWhileViewing;

impl Invariant for PlaintextOnlyWhileViewing {
    fn name(&self) -> &'static str {
        "plaintext_only_while_viewing"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        for snapshot in trace.snapshots() {
            let viewing = snapshot.state == ReadState::Viewing;
            if snapshot.holds_plaintext != viewing {
                return Err(self.violation(format!(
                    "holds_plaintext={} in {}",
                    snapshot.holds_plaintext, snapshot.state
                )));
            }
        }
        Ok(())
    }
}

/// Reaching `Viewing` issues the delete in the same step.
pub struct ViewingImpliesDelete;

impl Invariant for ViewingImpliesDelete {
    fn name(&self) -> &'static str {
        "viewing_implies_delete"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        for snapshot in trace.snapshots() {
            if snapshot.state == ReadState::Viewing
                && (!snapshot.revealed || snapshot.deletes_issued == 0)
            {
                return Err(self.violation(format!(
                    "viewing with revealed={} deletes_issued={}",
                    snapshot.revealed, snapshot.deletes_issued
                )));
            }
        }
        Ok(())
    }
}

/// After a reveal only the plaintext is kept, never the envelope.
pub struct EnvelopeReleasedOnReveal;

impl Invariant for EnvelopeReleasedOnReveal {
    fn name(&self) -> &'static str {
        "envelope_released_on_reveal"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        match trace.snapshots().iter().find(|s| s.revealed && s.holds_envelope) {
            Some(snapshot) => {
                Err(self.violation(format!("envelope still held in {}", snapshot.state)))
            },
            None => Ok(()),
        }
    }
}

/// A delete is issued only when none is in flight or confirmed: every request
/// after the first follows a reported failure.
pub struct DeleteNeverDuplicated;

impl Invariant for DeleteNeverDuplicated {
    fn name(&self) -> &'static str {
        "delete_never_duplicated"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        for snapshot in trace.snapshots() {
            if snapshot.deletes_issued > snapshot.delete_failures + 1 {
                return Err(self.violation(format!(
                    "{} deletes issued after {} failures",
                    snapshot.deletes_issued, snapshot.delete_failures
                )));
            }
        }
        Ok(())
    }
}
