//! Side effects requested by the state machines.
//!
//! Machines never perform I/O or heavy computation themselves; they return
//! these instructions and the runtime executes them in order.

use std::{fmt, time::Duration};

use cinder_core::{Expiration, Handle, Paste};
use cinder_crypto::Passphrase;
use zeroize::Zeroizing;

/// Actions produced by [`crate::ReadSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadAction {
    /// Render the session.
    Render,

    /// Fetch the paste.
    Fetch {
        /// Paste to fetch.
        handle: Handle,
    },

    /// Open and decode the envelope. CPU heavy for encrypted pastes.
    ///
    /// Always preceded by a [`ReadAction::Render`] so a busy indicator shows
    /// first.
    Decrypt {
        /// Fetched paste.
        paste: Paste,
        /// Passphrase, `None` for unencrypted pastes.
        passphrase: Option<Passphrase>,
    },

    /// Delete the paste server-side. Never cancelled.
    Delete {
        /// Paste to delete.
        handle: Handle,
    },

    /// Emit [`crate::ReadEvent::BurnTransitionElapsed`] after a pause.
    ScheduleBurnTransition {
        /// Pause length.
        after: Duration,
    },
}

/// Actions produced by [`crate::WriteFlow`].
#[derive(Clone, PartialEq, Eq)]
pub enum WriteAction {
    /// Render the flow.
    Render,

    /// Ask the writer to confirm a large encrypted upload.
    RequestConfirmation {
        /// Body size in bytes.
        size: u64,
    },

    /// Seal framed content into an envelope. CPU heavy with a passphrase.
    Seal {
        /// Framed `(title, body)`.
        framed: Zeroizing<Vec<u8>>,
        /// Passphrase, `None` for an unencrypted envelope.
        passphrase: Option<Passphrase>,
        /// Content type for the resulting paste.
        content_type: String,
    },

    /// Upload a sealed paste.
    Upload {
        /// Sealed paste.
        paste: Paste,
        /// Requested lifetime.
        expiration: Expiration,
    },
}

impl fmt::Debug for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render => f.write_str("Render"),
            Self::RequestConfirmation { size } => {
                f.debug_struct("RequestConfirmation").field("size", size).finish()
            },
            Self::Seal { framed, passphrase, content_type } => f
                .debug_struct("Seal")
                .field("framed_len", &framed.len())
                .field("encrypted", &passphrase.is_some())
                .field("content_type", content_type)
                .finish(),
            Self::Upload { paste, expiration } => f
                .debug_struct("Upload")
                .field("content_type", &paste.content_type())
                .field("len", &paste.len())
                .field("expiration", expiration)
                .finish(),
        }
    }
}
