//! Observable read and write states.
//!
//! These are the view model for drivers. [`ReadSnapshot`] additionally
//! exposes the bookkeeping that simulation invariants check.

use std::fmt;

use cinder_core::{Handle, PasteError};

/// Read lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadState {
    /// Fetching the paste.
    Loading,
    /// Paste is encrypted; waiting for a passphrase.
    Encrypted,
    /// Paste is not encrypted; waiting for the reader to reveal it.
    NotEncrypted,
    /// Plaintext is on screen.
    Viewing,
    /// Paste is gone. Terminal.
    Burned,
}

impl ReadState {
    /// Returns true for [`ReadState::Burned`].
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Burned)
    }

    /// Returns true if `self -> to` is a transition the lifecycle allows.
    ///
    /// Staying in place is always allowed. `Burned` only stays `Burned`.
    pub fn can_transition_to(self, to: Self) -> bool {
        use ReadState::{Burned, Encrypted, Loading, NotEncrypted, Viewing};

        match (self, to) {
            (from, to) if from == to => true,
            (Loading, Encrypted | NotEncrypted | Burned)
            | (Encrypted | NotEncrypted, Viewing | Burned)
            | (Viewing, Burned) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ReadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::Encrypted => "encrypted",
            Self::NotEncrypted => "not encrypted",
            Self::Viewing => "viewing",
            Self::Burned => "burned",
        };
        f.write_str(name)
    }
}

/// Server-side deletion progress for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deletion {
    /// No delete issued yet.
    #[default]
    NotRequested,
    /// A delete request is outstanding. Further triggers are no-ops.
    InFlight,
    /// The store acknowledged the delete. Further triggers are no-ops.
    Confirmed,
    /// The last delete failed. The next trigger issues a new request.
    Failed,
}

impl Deletion {
    /// Returns true while a new trigger would not issue a request.
    pub fn is_requested(self) -> bool {
        matches!(self, Self::InFlight | Self::Confirmed)
    }
}

/// Point-in-time view of a read session, free of plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSnapshot {
    /// Lifecycle state.
    pub state: ReadState,
    /// Deletion progress.
    pub deletion: Deletion,
    /// Delete requests issued so far.
    pub deletes_issued: usize,
    /// Delete requests that failed so far.
    pub delete_failures: usize,
    /// Plaintext was revealed at some point.
    pub revealed: bool,
    /// Plaintext is currently held.
    pub holds_plaintext: bool,
    /// The fetched envelope is currently held.
    pub holds_envelope: bool,
    /// A burn is in progress.
    pub burn_pending: bool,
    /// A fetch or decrypt is outstanding.
    pub busy: bool,
    /// Error shown to the reader, if any.
    pub error: Option<PasteError>,
}

/// Write lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WriteState {
    /// Waiting for content.
    #[default]
    Composing,
    /// Large encrypted upload; waiting for the writer to confirm.
    AwaitingConfirmation {
        /// Body size in bytes.
        size: u64,
    },
    /// Encrypting.
    Sealing,
    /// Upload in progress.
    Uploading,
    /// Upload failed; may be retried.
    UploadFailed,
    /// Stored. Terminal.
    Finished {
        /// Handle issued by the store.
        handle: Handle,
        /// Shareable link.
        link: String,
    },
    /// Rejected or cancelled. Terminal.
    Failed,
}

impl WriteState {
    /// Returns true for `Finished` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Failed)
    }

    /// Short state name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Composing => "composing",
            Self::AwaitingConfirmation { .. } => "awaiting confirmation",
            Self::Sealing => "sealing",
            Self::Uploading => "uploading",
            Self::UploadFailed => "upload failed",
            Self::Finished { .. } => "finished",
            Self::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burned_is_terminal() {
        assert!(ReadState::Burned.is_terminal());
        for state in
            [ReadState::Loading, ReadState::Encrypted, ReadState::NotEncrypted, ReadState::Viewing]
        {
            assert!(!state.is_terminal());
            assert!(!ReadState::Burned.can_transition_to(state));
        }
    }

    #[test]
    fn lifecycle_edges() {
        assert!(ReadState::Loading.can_transition_to(ReadState::Burned));
        assert!(ReadState::Encrypted.can_transition_to(ReadState::Viewing));
        assert!(ReadState::Viewing.can_transition_to(ReadState::Burned));

        assert!(!ReadState::Loading.can_transition_to(ReadState::Viewing));
        assert!(!ReadState::Viewing.can_transition_to(ReadState::Encrypted));
        assert!(!ReadState::Encrypted.can_transition_to(ReadState::NotEncrypted));
    }

    #[test]
    fn deletion_requested() {
        assert!(!Deletion::NotRequested.is_requested());
        assert!(Deletion::InFlight.is_requested());
        assert!(Deletion::Confirmed.is_requested());
        assert!(!Deletion::Failed.is_requested());
    }
}
