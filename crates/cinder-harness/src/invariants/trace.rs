//! Ordered snapshots of one read session.

use std::fmt;

use cinder_app::{ReadSnapshot, ReadState};

/// Every snapshot a session rendered, in order.
#[derive(Debug, Clone, Default)]
pub struct SessionTrace {
    snapshots: Vec<ReadSnapshot>,
}

impl SessionTrace {
    /// Append a snapshot.
    pub fn push(&mut self, snapshot: ReadSnapshot) {
        self.snapshots.push(snapshot);
    }

    /// All snapshots.
    pub fn snapshots(&self) -> &[ReadSnapshot] {
        &self.snapshots
    }

    /// Most recent snapshot.
    pub fn last(&self) -> Option<&ReadSnapshot> {
        self.snapshots.last()
    }

    /// Distinct states in order of appearance, repeats collapsed.
    pub fn states(&self) -> Vec<ReadState> {
        let mut states: Vec<ReadState> = self.snapshots.iter().map(|s| s.state).collect();
        states.dedup();
        states
    }

    /// Number of snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns true if nothing was rendered.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl fmt::Display for SessionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states().iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{state}")?;
        }
        Ok(())
    }
}
