//! Read lifecycle state machine.
//!
//! [`ReadSession`] consumes [`ReadEvent`]s and produces [`ReadAction`]s. It
//! performs no I/O, so every interleaving of completions and reader input can
//! be replayed deterministically.
//!
//! # Deletion
//!
//! The deletion flag flips to [`Deletion::InFlight`] in the same call that
//! emits [`ReadAction::Delete`]. Concurrent triggers (reveal, burn, retry,
//! abandon) therefore see the flag already set and emit nothing. Only a
//! reported failure re-arms it.
//!
//! # Burn
//!
//! ```text
//! BurnRequested ─► delete confirmed? ─ yes ─► ScheduleBurnTransition ─► Burned
//!                        │
//!                        └─ no ─► (issue or await delete) ─► DeleteCompleted ─┘
//!                                        └─► DeleteFailed: burn aborted, warning
//! ```

use std::time::Duration;

use cinder_core::{Handle, Paste, PasteError, StoreError};
use cinder_crypto::Passphrase;
use cinder_proto::FramedContent;

use crate::{
    AppConfig, Deletion, Presented, ReadAction, ReadEvent, ReadSnapshot, ReadState,
};

/// Read lifecycle for one handle.
///
/// Lives for a single reading session and is never persisted. Holds the
/// fetched envelope until it is decrypted, then only the plaintext, which is
/// wiped on burn.
#[derive(Debug)]
pub struct ReadSession {
    handle: Handle,
    state: ReadState,
    /// Fetched envelope. `None` before the fetch and after a reveal.
    paste: Option<Paste>,
    /// Plaintext. `Some` only while `Viewing`.
    presented: Option<Presented>,
    deletion: Deletion,
    deletes_issued: usize,
    delete_failures: usize,
    revealed: bool,
    /// Re-entrancy guard for burn.
    burn_pending: bool,
    fetching: bool,
    decrypting: bool,
    error: Option<PasteError>,
    /// Last delete failure, kept until a delete succeeds.
    delete_warning: Option<StoreError>,
    burn_transition: Duration,
}

impl ReadSession {
    /// Create a session for `handle`. Nothing happens until
    /// [`ReadSession::start`].
    pub fn new(handle: Handle, config: &AppConfig) -> Self {
        Self {
            handle,
            state: ReadState::Loading,
            paste: None,
            presented: None,
            deletion: Deletion::NotRequested,
            deletes_issued: 0,
            delete_failures: 0,
            revealed: false,
            burn_pending: false,
            fetching: false,
            decrypting: false,
            error: None,
            delete_warning: None,
            burn_transition: config.burn_transition,
        }
    }

    /// Issue the initial fetch. Idempotent.
    pub fn start(&mut self) -> Vec<ReadAction> {
        if self.state != ReadState::Loading || self.fetching || self.paste.is_some() {
            return vec![];
        }
        self.fetching = true;
        tracing::debug!(handle = %self.handle, "fetching paste");
        vec![ReadAction::Fetch { handle: self.handle.clone() }, ReadAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ReadEvent) -> Vec<ReadAction> {
        match event {
            ReadEvent::FetchCompleted(paste) => self.on_fetched(paste),
            ReadEvent::FetchFailed(err) => self.on_fetch_failed(err),
            ReadEvent::RetryFetch => self.retry_fetch(),
            ReadEvent::PassphraseSubmitted(passphrase) => self.submit_passphrase(passphrase),
            ReadEvent::RevealRequested => self.reveal(),
            ReadEvent::DecryptCompleted(result) => self.on_decrypted(result),
            ReadEvent::DeleteCompleted => self.on_deleted(),
            ReadEvent::DeleteFailed(err) => self.on_delete_failed(err),
            ReadEvent::RetryDelete => self.retry_delete(),
            ReadEvent::BurnRequested => self.burn(),
            ReadEvent::BurnTransitionElapsed => self.finish_burn(),
            ReadEvent::Abandoned => self.abandon(),
        }
    }

    /// Ask for the paste to be deleted server-side.
    ///
    /// Emits a single [`ReadAction::Delete`] and marks the deletion in
    /// flight. While a delete is in flight or confirmed, returns no actions.
    /// After a failure, issues a fresh request.
    pub fn request_delete(&mut self) -> Vec<ReadAction> {
        if self.deletion.is_requested() {
            tracing::debug!(handle = %self.handle, deletion = ?self.deletion, "delete already requested");
            return vec![];
        }

        self.deletion = Deletion::InFlight;
        self.deletes_issued += 1;
        tracing::debug!(handle = %self.handle, attempt = self.deletes_issued, "requesting delete");
        vec![ReadAction::Delete { handle: self.handle.clone() }]
    }

    fn on_fetched(&mut self, paste: Option<Paste>) -> Vec<ReadAction> {
        if !self.fetching || self.state != ReadState::Loading {
            return vec![];
        }
        self.fetching = false;

        let Some(paste) = paste else {
            self.error = Some(PasteError::NotFound);
            self.transition(ReadState::Burned);
            return vec![ReadAction::Render];
        };

        self.error = None;
        let next = if paste.is_encrypted() { ReadState::Encrypted } else { ReadState::NotEncrypted };
        self.paste = Some(paste);
        self.transition(next);
        vec![ReadAction::Render]
    }

    fn on_fetch_failed(&mut self, err: StoreError) -> Vec<ReadAction> {
        if !self.fetching || self.state != ReadState::Loading {
            return vec![];
        }
        self.fetching = false;

        tracing::warn!(handle = %self.handle, error = %err, "fetch failed");
        self.error = Some(PasteError::Storage(err));
        vec![ReadAction::Render]
    }

    fn retry_fetch(&mut self) -> Vec<ReadAction> {
        if self.state != ReadState::Loading || self.fetching {
            return vec![];
        }
        self.error = None;
        self.start()
    }

    fn submit_passphrase(&mut self, passphrase: Passphrase) -> Vec<ReadAction> {
        if self.state != ReadState::Encrypted || self.decrypting {
            return vec![];
        }
        let Some(paste) = &self.paste else {
            return vec![];
        };

        if passphrase.is_empty() {
            self.error = Some(PasteError::PasswordRequired);
            return vec![ReadAction::Render];
        }

        // Cheap hash check first; key derivation only runs for the right one
        if !paste.check_password(&passphrase) {
            tracing::debug!(handle = %self.handle, "wrong passphrase");
            self.error = Some(PasteError::WrongPassword);
            return vec![ReadAction::Render];
        }

        let paste = paste.clone();
        self.decrypting = true;
        self.error = None;
        vec![ReadAction::Render, ReadAction::Decrypt { paste, passphrase: Some(passphrase) }]
    }

    fn reveal(&mut self) -> Vec<ReadAction> {
        if self.state != ReadState::NotEncrypted || self.decrypting {
            return vec![];
        }
        let Some(paste) = &self.paste else {
            return vec![];
        };

        let paste = paste.clone();
        self.decrypting = true;
        self.error = None;
        vec![ReadAction::Render, ReadAction::Decrypt { paste, passphrase: None }]
    }

    fn on_decrypted(&mut self, result: Result<FramedContent, PasteError>) -> Vec<ReadAction> {
        if !self.decrypting {
            return vec![];
        }
        self.decrypting = false;

        if !matches!(self.state, ReadState::Encrypted | ReadState::NotEncrypted) {
            // Abandoned mid-decrypt; the plaintext is dropped unseen
            return vec![];
        }

        match result {
            Ok(content) => {
                let content_type = self.paste.take().map(Paste::into_parts).map(|(ct, _)| ct);
                self.presented = Some(Presented::new(content_type.unwrap_or_default(), content));
                self.revealed = true;
                self.error = None;
                self.transition(ReadState::Viewing);

                let mut actions = self.request_delete();
                actions.push(ReadAction::Render);
                actions
            },
            Err(err) => {
                tracing::debug!(handle = %self.handle, error = %err, "decrypt failed");
                self.error = Some(err);
                vec![ReadAction::Render]
            },
        }
    }

    fn on_deleted(&mut self) -> Vec<ReadAction> {
        if self.deletion != Deletion::InFlight {
            return vec![];
        }
        self.deletion = Deletion::Confirmed;
        self.delete_warning = None;
        tracing::info!(handle = %self.handle, "paste deleted");

        if self.state.is_terminal() {
            return vec![];
        }
        if self.burn_pending {
            return vec![
                ReadAction::ScheduleBurnTransition { after: self.burn_transition },
                ReadAction::Render,
            ];
        }
        vec![ReadAction::Render]
    }

    fn on_delete_failed(&mut self, err: StoreError) -> Vec<ReadAction> {
        if self.deletion != Deletion::InFlight {
            return vec![];
        }
        self.deletion = Deletion::Failed;
        self.delete_failures += 1;
        tracing::warn!(handle = %self.handle, error = %err, "delete failed, paste still stored");
        self.delete_warning = Some(err);

        if self.state.is_terminal() {
            return vec![];
        }
        if self.burn_pending {
            tracing::debug!(handle = %self.handle, "burn aborted");
            self.burn_pending = false;
        }
        vec![ReadAction::Render]
    }

    fn retry_delete(&mut self) -> Vec<ReadAction> {
        if self.state != ReadState::Viewing || self.deletion != Deletion::Failed {
            return vec![];
        }
        let mut actions = self.request_delete();
        actions.push(ReadAction::Render);
        actions
    }

    fn burn(&mut self) -> Vec<ReadAction> {
        if self.state != ReadState::Viewing || self.burn_pending {
            return vec![];
        }
        self.burn_pending = true;
        tracing::debug!(handle = %self.handle, deletion = ?self.deletion, "burn requested");

        match self.deletion {
            Deletion::Confirmed => vec![
                ReadAction::ScheduleBurnTransition { after: self.burn_transition },
                ReadAction::Render,
            ],
            Deletion::InFlight => vec![ReadAction::Render],
            Deletion::NotRequested | Deletion::Failed => {
                let mut actions = self.request_delete();
                actions.push(ReadAction::Render);
                actions
            },
        }
    }

    fn finish_burn(&mut self) -> Vec<ReadAction> {
        if self.state != ReadState::Viewing || !self.burn_pending {
            return vec![];
        }
        self.burn_pending = false;
        self.presented = None;
        self.transition(ReadState::Burned);
        vec![ReadAction::Render]
    }

    fn abandon(&mut self) -> Vec<ReadAction> {
        if self.state.is_terminal() {
            return vec![];
        }

        // A decrypt in flight already passed the passphrase check: the read
        // counts as consumed
        let consumed = self.revealed || self.decrypting;

        self.paste = None;
        self.presented = None;
        self.burn_pending = false;
        self.fetching = false;
        self.transition(ReadState::Burned);

        let mut actions = if consumed { self.request_delete() } else { vec![] };
        actions.push(ReadAction::Render);
        actions
    }

    fn transition(&mut self, to: ReadState) {
        debug_assert!(self.state.can_transition_to(to), "{} -> {to}", self.state);
        tracing::debug!(handle = %self.handle, from = %self.state, to = %to, "read state");
        self.state = to;
    }

    /// Handle being read.
    pub fn handle_id(&self) -> &Handle {
        &self.handle
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Plaintext, while viewing.
    pub fn presented(&self) -> Option<&Presented> {
        self.presented.as_ref()
    }

    /// Deletion progress.
    pub fn deletion(&self) -> Deletion {
        self.deletion
    }

    /// Error to show the reader, if any.
    pub fn error(&self) -> Option<&PasteError> {
        self.error.as_ref()
    }

    /// Last delete failure, until a delete succeeds.
    pub fn delete_warning(&self) -> Option<&StoreError> {
        self.delete_warning.as_ref()
    }

    /// Returns true while a burn is in progress.
    pub fn is_burning(&self) -> bool {
        self.burn_pending
    }

    /// Returns true while a fetch or decrypt is outstanding.
    pub fn is_busy(&self) -> bool {
        self.fetching || self.decrypting
    }

    /// Returns true if the fetched paste is encrypted. `None` before the
    /// fetch and after the envelope was released.
    pub fn is_encrypted(&self) -> Option<bool> {
        self.paste.as_ref().map(Paste::is_encrypted)
    }

    /// Plaintext-free view for invariant checks.
    pub fn snapshot(&self) -> ReadSnapshot {
        ReadSnapshot {
            state: self.state,
            deletion: self.deletion,
            deletes_issued: self.deletes_issued,
            delete_failures: self.delete_failures,
            revealed: self.revealed,
            holds_plaintext: self.presented.is_some(),
            holds_envelope: self.paste.is_some(),
            burn_pending: self.burn_pending,
            busy: self.is_busy(),
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use cinder_crypto::seal;
    use cinder_proto::encode;

    use super::*;

    fn handle() -> Handle {
        Handle::new("h=")
    }

    fn session() -> ReadSession {
        let mut session = ReadSession::new(handle(), &AppConfig::default());
        let _ = session.start();
        session
    }

    fn plain_paste(title: &str, body: &[u8]) -> Paste {
        Paste::new("text/plain", seal(&encode(title, body), None, [0; 16]))
    }

    fn locked_paste(pass: &str) -> Paste {
        Paste::new("text/plain", seal(&encode("", b"secret"), Some(&Passphrase::new(pass)), [9; 16]))
    }

    /// Session that revealed a plain paste; the first delete is in flight.
    fn viewing() -> ReadSession {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchCompleted(Some(plain_paste("", b"hi"))));
        let _ = session.handle(ReadEvent::RevealRequested);
        let _ = session.handle(ReadEvent::DecryptCompleted(Ok(FramedContent::new("", b"hi"))));
        session
    }

    fn deletes(actions: &[ReadAction]) -> usize {
        actions.iter().filter(|a| matches!(a, ReadAction::Delete { .. })).count()
    }

    #[test]
    fn start_fetches_once() {
        let mut session = ReadSession::new(handle(), &AppConfig::default());
        let actions = session.start();

        assert!(matches!(actions.as_slice(), [ReadAction::Fetch { .. }, ReadAction::Render]));
        assert!(session.start().is_empty());
        assert!(session.is_busy());
    }

    #[test]
    fn not_found_burns() {
        let mut session = session();
        let actions = session.handle(ReadEvent::FetchCompleted(None));

        assert_eq!(actions, vec![ReadAction::Render]);
        assert_eq!(session.state(), ReadState::Burned);
        assert_eq!(session.error(), Some(&PasteError::NotFound));
        assert_eq!(session.deletion(), Deletion::NotRequested);
    }

    #[test]
    fn fetch_classifies_encryption() {
        let mut plain = session();
        let _ = plain.handle(ReadEvent::FetchCompleted(Some(plain_paste("", b"x"))));
        assert_eq!(plain.state(), ReadState::NotEncrypted);
        assert_eq!(plain.is_encrypted(), Some(false));

        let mut locked = session();
        let _ = locked.handle(ReadEvent::FetchCompleted(Some(locked_paste("pw"))));
        assert_eq!(locked.state(), ReadState::Encrypted);
    }

    #[test]
    fn fetch_failure_is_retryable() {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchFailed(StoreError::Io("offline".into())));

        assert_eq!(session.state(), ReadState::Loading);
        assert!(session.error().is_some_and(PasteError::is_recoverable));
        assert!(!session.is_busy());

        let actions = session.handle(ReadEvent::RetryFetch);
        assert!(matches!(actions.as_slice(), [ReadAction::Fetch { .. }, ReadAction::Render]));
        assert_eq!(session.error(), None);

        // Only one fetch outstanding at a time
        assert!(session.handle(ReadEvent::RetryFetch).is_empty());
    }

    #[test]
    fn stale_fetch_completion_ignored() {
        let mut session = ReadSession::new(handle(), &AppConfig::default());
        assert!(session.handle(ReadEvent::FetchCompleted(None)).is_empty());
        assert_eq!(session.state(), ReadState::Loading);
    }

    #[test]
    fn wrong_passphrase_stays_encrypted() {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchCompleted(Some(locked_paste("secret"))));

        let actions = session.handle(ReadEvent::PassphraseSubmitted(Passphrase::new("wrong")));
        assert_eq!(actions, vec![ReadAction::Render]);
        assert_eq!(session.state(), ReadState::Encrypted);
        assert_eq!(session.error(), Some(&PasteError::WrongPassword));
        assert!(!session.is_busy());
    }

    #[test]
    fn empty_passphrase_is_required_error() {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchCompleted(Some(locked_paste("secret"))));

        let _ = session.handle(ReadEvent::PassphraseSubmitted(Passphrase::new("")));
        assert_eq!(session.error(), Some(&PasteError::PasswordRequired));
    }

    #[test]
    fn right_passphrase_renders_before_decrypt() {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchCompleted(Some(locked_paste("secret"))));

        let actions = session.handle(ReadEvent::PassphraseSubmitted(Passphrase::new("secret")));
        assert!(matches!(actions.as_slice(), [
            ReadAction::Render,
            ReadAction::Decrypt { passphrase: Some(_), .. }
        ]));
        assert!(session.is_busy());

        // Second submit while decrypting is ignored
        assert!(session.handle(ReadEvent::PassphraseSubmitted(Passphrase::new("secret"))).is_empty());
    }

    #[test]
    fn reveal_enters_viewing_and_deletes() {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchCompleted(Some(plain_paste("note.txt", b"hello"))));

        let actions = session.handle(ReadEvent::RevealRequested);
        assert!(matches!(actions.as_slice(), [
            ReadAction::Render,
            ReadAction::Decrypt { passphrase: None, .. }
        ]));

        let actions =
            session.handle(ReadEvent::DecryptCompleted(Ok(FramedContent::new("note.txt", b"hello"))));
        assert_eq!(actions, vec![ReadAction::Delete { handle: handle() }, ReadAction::Render]);

        assert_eq!(session.state(), ReadState::Viewing);
        assert_eq!(session.deletion(), Deletion::InFlight);
        assert_eq!(session.is_encrypted(), None, "envelope released after reveal");

        let presented = session.presented().unwrap();
        assert_eq!(presented.title(), "note.txt");
        assert_eq!(presented.body(), b"hello");
    }

    #[test]
    fn decrypt_failure_surfaces_error() {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchCompleted(Some(plain_paste("", b"x"))));
        let _ = session.handle(ReadEvent::RevealRequested);

        let _ = session.handle(ReadEvent::DecryptCompleted(Err(PasteError::MalformedFraming)));
        assert_eq!(session.state(), ReadState::NotEncrypted);
        assert_eq!(session.error(), Some(&PasteError::MalformedFraming));
        assert_eq!(session.deletion(), Deletion::NotRequested);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut session = viewing();
        assert_eq!(session.snapshot().deletes_issued, 1);

        // Second trigger while in flight: no-op
        assert!(session.request_delete().is_empty());

        let _ = session.handle(ReadEvent::DeleteCompleted);
        assert_eq!(session.deletion(), Deletion::Confirmed);

        // Trigger after confirmation: still a no-op
        assert!(session.request_delete().is_empty());
        assert_eq!(session.snapshot().deletes_issued, 1);
    }

    #[test]
    fn delete_failure_keeps_viewing_and_rearms() {
        let mut session = viewing();
        let _ = session.handle(ReadEvent::DeleteFailed(StoreError::Io("offline".into())));

        assert_eq!(session.state(), ReadState::Viewing);
        assert_eq!(session.deletion(), Deletion::Failed);
        assert!(session.delete_warning().is_some());
        assert!(session.presented().is_some());

        let actions = session.handle(ReadEvent::RetryDelete);
        assert_eq!(deletes(&actions), 1);
        assert_eq!(session.deletion(), Deletion::InFlight);

        let _ = session.handle(ReadEvent::DeleteCompleted);
        assert_eq!(session.delete_warning(), None);
        assert_eq!(session.snapshot().deletes_issued, 2);
    }

    #[test]
    fn burn_waits_for_inflight_delete() {
        let mut session = viewing();

        let actions = session.handle(ReadEvent::BurnRequested);
        assert_eq!(actions, vec![ReadAction::Render]);
        assert!(session.is_burning());

        // Re-entrant burn is ignored
        assert!(session.handle(ReadEvent::BurnRequested).is_empty());

        let actions = session.handle(ReadEvent::DeleteCompleted);
        assert!(matches!(actions.as_slice(), [
            ReadAction::ScheduleBurnTransition { after },
            ReadAction::Render
        ] if *after == Duration::from_secs(1)));

        let _ = session.handle(ReadEvent::BurnTransitionElapsed);
        assert_eq!(session.state(), ReadState::Burned);
        assert!(session.presented().is_none());
        assert_eq!(session.snapshot().deletes_issued, 1);
    }

    #[test]
    fn burn_after_confirmed_delete_schedules_transition() {
        let mut session = viewing();
        let _ = session.handle(ReadEvent::DeleteCompleted);

        let actions = session.handle(ReadEvent::BurnRequested);
        assert!(matches!(actions.as_slice(), [
            ReadAction::ScheduleBurnTransition { .. },
            ReadAction::Render
        ]));
        assert_eq!(deletes(&actions), 0);
    }

    #[test]
    fn burn_with_failed_delete_aborts_then_retries() {
        let mut session = viewing();
        let _ = session.handle(ReadEvent::DeleteFailed(StoreError::Io("offline".into())));

        // Burn re-issues the delete
        let actions = session.handle(ReadEvent::BurnRequested);
        assert_eq!(deletes(&actions), 1);

        // Which fails too: burn aborted, still viewing
        let _ = session.handle(ReadEvent::DeleteFailed(StoreError::Io("offline".into())));
        assert_eq!(session.state(), ReadState::Viewing);
        assert!(!session.is_burning());
        assert!(session.delete_warning().is_some());

        // A stale timer cannot burn without a confirmed delete
        assert!(session.handle(ReadEvent::BurnTransitionElapsed).is_empty());

        let actions = session.handle(ReadEvent::BurnRequested);
        assert_eq!(deletes(&actions), 1);
        let _ = session.handle(ReadEvent::DeleteCompleted);
        let _ = session.handle(ReadEvent::BurnTransitionElapsed);
        assert_eq!(session.state(), ReadState::Burned);
    }

    #[test]
    fn abandon_after_reveal_with_failed_delete_issues_delete() {
        let mut session = viewing();
        let _ = session.handle(ReadEvent::DeleteFailed(StoreError::Io("offline".into())));

        let actions = session.handle(ReadEvent::Abandoned);
        assert_eq!(deletes(&actions), 1);
        assert_eq!(session.state(), ReadState::Burned);
        assert!(session.presented().is_none());
    }

    #[test]
    fn abandon_during_decrypt_deletes_and_drops_plaintext() {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchCompleted(Some(plain_paste("", b"x"))));
        let _ = session.handle(ReadEvent::RevealRequested);

        let actions = session.handle(ReadEvent::Abandoned);
        assert_eq!(deletes(&actions), 1);

        let actions = session.handle(ReadEvent::DecryptCompleted(Ok(FramedContent::new("", b"x"))));
        assert!(actions.is_empty());
        assert!(session.presented().is_none());
        assert_eq!(session.state(), ReadState::Burned);
    }

    #[test]
    fn abandon_before_reveal_leaves_paste() {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchCompleted(Some(locked_paste("pw"))));

        let actions = session.handle(ReadEvent::Abandoned);
        assert_eq!(actions, vec![ReadAction::Render]);
        assert_eq!(session.deletion(), Deletion::NotRequested);
    }

    #[test]
    fn burned_ignores_everything() {
        let mut session = session();
        let _ = session.handle(ReadEvent::FetchCompleted(None));

        for event in [
            ReadEvent::RetryFetch,
            ReadEvent::RevealRequested,
            ReadEvent::PassphraseSubmitted(Passphrase::new("x")),
            ReadEvent::BurnRequested,
            ReadEvent::BurnTransitionElapsed,
            ReadEvent::RetryDelete,
            ReadEvent::Abandoned,
        ] {
            assert!(session.handle(event).is_empty());
            assert_eq!(session.state(), ReadState::Burned);
        }
    }
}
