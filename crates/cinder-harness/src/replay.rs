//! Replaying arbitrary reader and completion sequences.
//!
//! A [`ReaderOp`] is either reader input or a store/decrypt completion. The
//! sequence is fed straight into a [`ReadSession`] with no runtime in between,
//! so completions can arrive stale, twice, or without a matching request. The
//! session must ignore what does not apply and keep every invariant.

use arbitrary::Arbitrary;
use cinder_app::{AppConfig, ReadEvent, ReadSession};
use cinder_core::{Handle, Paste, PasteError, StoreError};
use cinder_crypto::{HEADER_LEN, IV_LEN, Passphrase, password_hash, seal};
use cinder_proto::{FramedContent, encode};

use crate::invariants::SessionTrace;

/// Passphrase of the encrypted fixture.
pub const PASSPHRASE: &str = "correct horse";

/// One reader action or collaborator completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ReaderOp {
    /// Store returns the paste.
    FetchFound {
        /// Return the encrypted fixture.
        encrypted: bool,
    },
    /// Store has no such paste.
    FetchMissing,
    /// Store fetch fails.
    FetchFails,
    /// Reader retries the fetch.
    RetryFetch,
    /// Reader submits the right passphrase.
    SubmitRight,
    /// Reader submits a wrong passphrase.
    SubmitWrong,
    /// Reader submits an empty passphrase.
    SubmitEmpty,
    /// Reader reveals an unencrypted paste.
    Reveal,
    /// Decrypt succeeds.
    DecryptOk,
    /// Decrypt fails.
    DecryptFails,
    /// Store acknowledges the delete.
    DeleteOk,
    /// Store delete fails.
    DeleteFails,
    /// Reader retries the delete.
    RetryDelete,
    /// Reader presses burn.
    Burn,
    /// Burn transition timer fires.
    BurnElapsed,
    /// Reader leaves.
    Abandon,
}

impl ReaderOp {
    /// Every operation, encrypted and plain fetches included.
    pub const ALL: [Self; 17] = [
        Self::FetchFound { encrypted: true },
        Self::FetchFound { encrypted: false },
        Self::FetchMissing,
        Self::FetchFails,
        Self::RetryFetch,
        Self::SubmitRight,
        Self::SubmitWrong,
        Self::SubmitEmpty,
        Self::Reveal,
        Self::DecryptOk,
        Self::DecryptFails,
        Self::DeleteOk,
        Self::DeleteFails,
        Self::RetryDelete,
        Self::Burn,
        Self::BurnElapsed,
        Self::Abandon,
    ];

    /// The event this operation delivers.
    pub fn event(self) -> ReadEvent {
        match self {
            Self::FetchFound { encrypted: true } => ReadEvent::FetchCompleted(Some(locked_paste())),
            Self::FetchFound { encrypted: false } => ReadEvent::FetchCompleted(Some(plain_paste())),
            Self::FetchMissing => ReadEvent::FetchCompleted(None),
            Self::FetchFails => ReadEvent::FetchFailed(StoreError::Io("fetch".into())),
            Self::RetryFetch => ReadEvent::RetryFetch,
            Self::SubmitRight => ReadEvent::PassphraseSubmitted(Passphrase::new(PASSPHRASE)),
            Self::SubmitWrong => ReadEvent::PassphraseSubmitted(Passphrase::new("wrong")),
            Self::SubmitEmpty => ReadEvent::PassphraseSubmitted(Passphrase::new("")),
            Self::Reveal => ReadEvent::RevealRequested,
            Self::DecryptOk => ReadEvent::DecryptCompleted(Ok(FramedContent::new("", b"hello"))),
            Self::DecryptFails => ReadEvent::DecryptCompleted(Err(PasteError::MalformedFraming)),
            Self::DeleteOk => ReadEvent::DeleteCompleted,
            Self::DeleteFails => ReadEvent::DeleteFailed(StoreError::Io("delete".into())),
            Self::RetryDelete => ReadEvent::RetryDelete,
            Self::Burn => ReadEvent::BurnRequested,
            Self::BurnElapsed => ReadEvent::BurnTransitionElapsed,
            Self::Abandon => ReadEvent::Abandoned,
        }
    }
}

fn plain_paste() -> Paste {
    Paste::new("text/plain", seal(&encode("", b"hello"), None, [0; IV_LEN]))
}

/// Encrypted-looking envelope with a valid marker. Never decrypted here, so
/// no key derivation is paid for.
fn locked_paste() -> Paste {
    let mut envelope = Vec::with_capacity(HEADER_LEN + 8);
    envelope.extend_from_slice(&password_hash(&Passphrase::new(PASSPHRASE)));
    envelope.extend_from_slice(&[0x11; IV_LEN]);
    envelope.extend_from_slice(b"cipher..");
    Paste::new("text/plain", envelope)
}

/// Run `ops` against a fresh session, snapshotting after each.
pub fn replay(ops: &[ReaderOp]) -> (ReadSession, SessionTrace) {
    let mut session = ReadSession::new(Handle::new("replay="), &AppConfig::default());
    let mut trace = SessionTrace::default();

    let _ = session.start();
    trace.push(session.snapshot());

    for op in ops {
        let _ = session.handle(op.event());
        trace.push(session.snapshot());
    }
    (session, trace)
}
