//! Generic runtimes for the read and write flows.
//!
//! A runtime owns a state machine, a driver, a store and an environment. It
//! feeds driver input and side-effect completions into the machine and
//! executes the actions that come back:
//!
//! - store calls run as spawned tasks and report back over a channel
//! - decrypt and seal run on the blocking pool
//! - timers sleep through the [`Environment`], so simulations control time
//!
//! Fetches and timers stop when the session ends or is cancelled. Deletes are
//! never cancelled: the read runtime waits for every delete it issued before
//! returning.

use std::{collections::VecDeque, time::Duration};

use cinder_core::{Environment, Handle, Paste, PasteError, PasteStore};
use cinder_crypto::{IV_LEN, Passphrase, seal};
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
    AppConfig, ReadAction, ReadDriver, ReadEvent, ReadSession, RuntimeError, WriteAction,
    WriteDriver, WriteError, WriteEvent, WriteFlow, WriteRequest, WriteState,
};

/// Runs a [`ReadSession`] to completion.
///
/// # Type Parameters
///
/// - `D`: reader input and rendering
/// - `S`: paste store
/// - `E`: environment for timers
pub struct ReadRuntime<D, S, E>
where
    D: ReadDriver,
    S: PasteStore,
    E: Environment,
{
    driver: D,
    store: S,
    env: E,
    session: ReadSession,
    /// Caller-facing cancellation: fires `Abandoned`.
    cancel: CancellationToken,
    /// Fetches and timers; cancelled when the session ends.
    background: CancellationToken,
    events_tx: mpsc::UnboundedSender<ReadEvent>,
    events_rx: mpsc::UnboundedReceiver<ReadEvent>,
    deletes: JoinSet<()>,
}

enum Step {
    Event(ReadEvent),
    Leave,
}

impl<D, S, E> ReadRuntime<D, S, E>
where
    D: ReadDriver,
    S: PasteStore,
    E: Environment,
{
    /// Create a runtime that will read `handle`.
    pub fn new(driver: D, store: S, env: E, handle: Handle, config: &AppConfig) -> Self {
        let cancel = CancellationToken::new();
        let background = cancel.child_token();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            driver,
            store,
            env,
            session: ReadSession::new(handle, config),
            cancel,
            background,
            events_tx,
            events_rx,
            deletes: JoinSet::new(),
        }
    }

    /// Token that abandons the session when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current session.
    pub fn session(&self) -> &ReadSession {
        &self.session
    }

    /// Run until the session is burned, the reader leaves, or the token is
    /// cancelled. Returns the finished session.
    ///
    /// Waits for outstanding deletes before returning, on the error path
    /// too.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails. The session is abandoned first,
    /// so a revealed paste still gets a delete.
    pub async fn run(mut self) -> Result<ReadSession, RuntimeError<D::Error>> {
        let outcome = self.drive().await;

        if outcome.is_err() && !self.session.state().is_terminal() {
            for action in self.session.handle(ReadEvent::Abandoned) {
                if let ReadAction::Delete { handle } = action {
                    self.spawn_delete(handle);
                }
            }
        }

        self.settle().await;
        outcome.map(|()| self.session)
    }

    async fn drive(&mut self) -> Result<(), RuntimeError<D::Error>> {
        let actions = self.session.start();
        self.execute(actions)?;

        while !self.session.state().is_terminal() {
            let step = tokio::select! {
                biased;
                () = self.cancel.cancelled() => Step::Leave,
                Some(event) = self.events_rx.recv() => Step::Event(event),
                input = self.driver.next_input() => match input.map_err(RuntimeError::Driver)? {
                    Some(event) => Step::Event(event),
                    None => Step::Leave,
                },
            };

            let event = match step {
                Step::Event(event) => event,
                Step::Leave => {
                    tracing::debug!(handle = %self.session.handle_id(), "reader left");
                    ReadEvent::Abandoned
                },
            };

            let actions = self.session.handle(event);
            self.execute(actions)?;
        }
        Ok(())
    }

    /// Stop background work, wait for deletes, apply their outcomes.
    async fn settle(&mut self) {
        self.background.cancel();

        while let Some(joined) = self.deletes.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "delete task failed");
            }
        }

        while let Ok(event) = self.events_rx.try_recv() {
            // Terminal: only deletion bookkeeping changes, no new effects
            let _ = self.session.handle(event);
        }
    }

    fn execute(&mut self, actions: Vec<ReadAction>) -> Result<(), RuntimeError<D::Error>> {
        for action in actions {
            match action {
                ReadAction::Render => {
                    self.driver.render(&self.session).map_err(RuntimeError::Driver)?;
                },
                ReadAction::Fetch { handle } => self.spawn_fetch(handle),
                ReadAction::Decrypt { paste, passphrase } => self.spawn_decrypt(paste, passphrase),
                ReadAction::Delete { handle } => self.spawn_delete(handle),
                ReadAction::ScheduleBurnTransition { after } => self.spawn_burn_timer(after),
            }
        }
        Ok(())
    }

    fn spawn_fetch(&self, handle: Handle) {
        let store = self.store.clone();
        let events = self.events_tx.clone();
        let cancel = self.background.child_token();

        tokio::spawn(async move {
            let event = tokio::select! {
                () = cancel.cancelled() => return,
                result = store.fetch(&handle) => match result {
                    Ok(paste) => ReadEvent::FetchCompleted(paste),
                    Err(err) => ReadEvent::FetchFailed(err),
                },
            };
            let _ = events.send(event);
        });
    }

    fn spawn_decrypt(&self, paste: Paste, passphrase: Option<Passphrase>) {
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let joined =
                tokio::task::spawn_blocking(move || paste.decrypted(passphrase.as_ref())).await;
            let result = joined.unwrap_or_else(|err| {
                tracing::error!(error = %err, "decrypt task failed");
                Err(PasteError::MalformedFraming)
            });
            let _ = events.send(ReadEvent::DecryptCompleted(result));
        });
    }

    fn spawn_delete(&mut self, handle: Handle) {
        let store = self.store.clone();
        let events = self.events_tx.clone();

        self.deletes.spawn(async move {
            let event = match store.delete(&handle).await {
                Ok(()) => ReadEvent::DeleteCompleted,
                Err(err) => ReadEvent::DeleteFailed(err),
            };
            let _ = events.send(event);
        });
    }

    fn spawn_burn_timer(&self, after: Duration) {
        let env = self.env.clone();
        let events = self.events_tx.clone();
        let cancel = self.background.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {},
                () = env.sleep(after) => {
                    let _ = events.send(ReadEvent::BurnTransitionElapsed);
                },
            }
        });
    }
}

/// Runs a [`WriteFlow`] to a link or an error.
pub struct WriteRuntime<D, S, E>
where
    D: WriteDriver,
    S: PasteStore,
    E: Environment,
{
    driver: D,
    store: S,
    env: E,
    flow: WriteFlow,
}

impl<D, S, E> WriteRuntime<D, S, E>
where
    D: WriteDriver,
    S: PasteStore,
    E: Environment,
{
    /// Create a runtime. The environment supplies IVs and the upload time.
    pub fn new(driver: D, store: S, env: E, config: AppConfig) -> Self {
        Self { driver, store, env, flow: WriteFlow::new(config) }
    }

    /// Current flow.
    pub fn flow(&self) -> &WriteFlow {
        &self.flow
    }

    /// Publish `request`. Returns the handle and share link.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Write` if the request is rejected, declined, or the
    ///   upload fails and the driver does not retry
    /// - `RuntimeError::Driver` if the driver fails
    pub async fn run(
        mut self,
        request: WriteRequest,
    ) -> Result<(Handle, String), RuntimeError<D::Error>> {
        let mut pending: VecDeque<WriteAction> =
            self.flow.handle(WriteEvent::Submit(request)).into();

        loop {
            while let Some(action) = pending.pop_front() {
                if let Some(event) = self.execute(action).await? {
                    pending.extend(self.flow.handle(event));
                }
            }

            let event = match self.flow.state() {
                WriteState::Finished { handle, link } => return Ok((handle.clone(), link.clone())),
                WriteState::Failed => {
                    let err = self.flow.error().cloned().unwrap_or(WriteError::Cancelled);
                    return Err(err.into());
                },
                WriteState::UploadFailed => {
                    let retry = match self.flow.upload_error() {
                        Some(err) => self
                            .driver
                            .retry_upload(err, self.flow.upload_attempts())
                            .await
                            .map_err(RuntimeError::Driver)?,
                        None => false,
                    };
                    if retry { WriteEvent::RetryUpload } else { WriteEvent::Cancelled }
                },
                state @ (WriteState::Composing
                | WriteState::AwaitingConfirmation { .. }
                | WriteState::Sealing
                | WriteState::Uploading) => return Err(RuntimeError::Stalled(state.name())),
            };
            pending.extend(self.flow.handle(event));
        }
    }

    async fn execute(
        &mut self,
        action: WriteAction,
    ) -> Result<Option<WriteEvent>, RuntimeError<D::Error>> {
        match action {
            WriteAction::Render => {
                self.driver.render(&self.flow).map_err(RuntimeError::Driver)?;
                Ok(None)
            },
            WriteAction::RequestConfirmation { size } => {
                let confirmed =
                    self.driver.confirm_large(size).await.map_err(RuntimeError::Driver)?;
                Ok(Some(if confirmed { WriteEvent::Confirmed } else { WriteEvent::Declined }))
            },
            WriteAction::Seal { framed, passphrase, content_type } => {
                let mut iv = [0u8; IV_LEN];
                self.env.random_bytes(&mut iv);

                let joined =
                    tokio::task::spawn_blocking(move || seal(&framed, passphrase.as_ref(), iv))
                        .await;
                match joined {
                    Ok(envelope) => Ok(Some(WriteEvent::Sealed(Paste::new(content_type, envelope)))),
                    Err(err) => {
                        tracing::error!(error = %err, "seal task failed");
                        Ok(Some(WriteEvent::Cancelled))
                    },
                }
            },
            WriteAction::Upload { paste, expiration } => {
                let expires_at = expiration.expires_at(self.env.wall_clock_secs());
                let event = match self.store.create(paste, expires_at).await {
                    Ok(handle) => WriteEvent::UploadCompleted(handle),
                    Err(err) => WriteEvent::UploadFailed(err),
                };
                Ok(Some(event))
            },
        }
    }
}
