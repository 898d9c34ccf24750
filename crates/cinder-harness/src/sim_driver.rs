//! Simulation drivers implementing the read and write driver traits.
//!
//! [`SimReadDriver`] plays a scripted reader: each [`Step`] fires once the
//! session renders the state it waits for. [`SimWriteDriver`] answers
//! confirmation and retry prompts from fixed policies. Both record what they
//! saw, and clones share the recording so tests can inspect it after the
//! runtime consumed the driver.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use cinder_app::{
    ContentKind, Deletion, ReadDriver, ReadEvent, ReadSession, ReadSnapshot, ReadState, WriteDriver, WriteFlow,
};
use cinder_core::StoreError;

use crate::invariants::{InvariantRegistry, SessionTrace};

/// Error type for simulation drivers.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// When a scripted step may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    /// State matches; nothing is busy and no burn is pending.
    Idle,
    /// As `Idle`, and no delete is in flight.
    Settled,
    /// State matches, regardless of outstanding work.
    Now,
}

/// One scripted reader action.
#[derive(Debug)]
pub struct Step {
    when: ReadState,
    event: ReadEvent,
    wait: Wait,
    optional: bool,
}

impl Step {
    /// Send `event` once the session idles in `when`.
    pub fn on(when: ReadState, event: ReadEvent) -> Self {
        Self { when, event, wait: Wait::Idle, optional: false }
    }

    /// Also wait for any in-flight delete to finish.
    #[must_use]
    pub fn settled(mut self) -> Self {
        self.wait = Wait::Settled;
        self
    }

    /// Fire as soon as the state matches, even mid-fetch or mid-decrypt.
    #[must_use]
    pub fn now(mut self) -> Self {
        self.wait = Wait::Now;
        self
    }

    /// Skip this step if the session settles in some other state.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn ready(&self, snapshot: &ReadSnapshot) -> bool {
        if snapshot.state != self.when {
            return false;
        }
        match self.wait {
            Wait::Now => true,
            Wait::Idle => idle(snapshot),
            Wait::Settled => settled(snapshot),
        }
    }

    fn skippable(&self, snapshot: &ReadSnapshot) -> bool {
        self.optional && snapshot.state != self.when && settled(snapshot)
    }
}

fn idle(snapshot: &ReadSnapshot) -> bool {
    !snapshot.busy && !snapshot.burn_pending
}

/// Idle, and no delete in flight: nothing will happen without input.
fn settled(snapshot: &ReadSnapshot) -> bool {
    idle(snapshot) && snapshot.deletion != Deletion::InFlight
}

/// Content the reader had on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    /// Display title.
    pub title: String,
    /// Body bytes.
    pub body: Vec<u8>,
    /// How it was presented.
    pub kind: ContentKind,
}

#[derive(Default)]
struct ReadShared {
    script: VecDeque<Step>,
    trace: SessionTrace,
    seen: Option<Seen>,
    linger: bool,
}

/// Scripted reader for deterministic testing.
///
/// Once the script is exhausted the reader leaves (the runtime sees end of
/// input) as soon as the session settles, unless told to linger, in which case
/// it waits for cancellation.
#[derive(Clone)]
pub struct SimReadDriver {
    shared: Arc<Mutex<ReadShared>>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl SimReadDriver {
    /// Reader that will play `steps` in order.
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let shared = ReadShared { script: steps.into_iter().collect(), ..ReadShared::default() };
        Self { shared: Arc::new(Mutex::new(shared)), invariants: None }
    }

    /// Check invariants over the trace on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    /// Stay after the script ends instead of leaving.
    #[must_use]
    pub fn lingering(self) -> Self {
        self.lock().linger = true;
        self
    }

    /// Snapshots rendered so far.
    pub fn trace(&self) -> SessionTrace {
        self.lock().trace.clone()
    }

    /// Last plaintext the reader was shown.
    pub fn seen(&self) -> Option<Seen> {
        self.lock().seen.clone()
    }

    /// Scripted steps not yet played.
    pub fn remaining_steps(&self) -> usize {
        self.lock().script.len()
    }

    fn lock(&self) -> MutexGuard<'_, ReadShared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_ready(&self) -> Option<Option<ReadEvent>> {
        let mut shared = self.lock();
        let last = shared.trace.last()?.clone();

        while shared.script.front().is_some_and(|step| step.skippable(&last)) {
            shared.script.pop_front();
        }

        match shared.script.front() {
            Some(step) if step.ready(&last) => {
                let step = shared.script.pop_front()?;
                tracing::debug!(state = %last.state, event = ?step.event, "reader acts");
                Some(Some(step.event))
            },
            Some(_) => None,
            None => (settled(&last) && !shared.linger).then_some(None),
        }
    }
}

impl ReadDriver for SimReadDriver {
    type Error = SimDriverError;

    async fn next_input(&mut self) -> Result<Option<ReadEvent>, Self::Error> {
        match self.next_ready() {
            Some(input) => Ok(input),
            // The runtime polls again after the next render
            None => std::future::pending().await,
        }
    }

    fn render(&mut self, session: &ReadSession) -> Result<(), Self::Error> {
        let mut shared = self.lock();
        shared.trace.push(session.snapshot());
        if let Some(presented) = session.presented() {
            shared.seen = Some(Seen {
                title: presented.title().to_owned(),
                body: presented.body().to_vec(),
                kind: presented.kind(),
            });
        }

        if let Some(registry) = &self.invariants
            && let Err(violations) = registry.check_all(&shared.trace)
        {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            return Err(SimDriverError(format!("{} after {}", messages.join("; "), shared.trace)));
        }
        Ok(())
    }
}

/// What a [`SimWriteDriver`] was asked and shown.
#[derive(Debug, Clone, Default)]
pub struct WriteLog {
    /// Sizes the writer was asked to confirm.
    pub confirmations: Vec<u64>,
    /// Upload attempts the writer was asked to retry after.
    pub retry_prompts: Vec<u32>,
    /// Rendered state names, repeats collapsed.
    pub states: Vec<&'static str>,
}

/// Writer with fixed answers to prompts.
#[derive(Clone)]
pub struct SimWriteDriver {
    confirm: bool,
    max_attempts: u32,
    log: Arc<Mutex<WriteLog>>,
}

impl Default for SimWriteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWriteDriver {
    /// Writer that confirms large uploads and never retries.
    pub fn new() -> Self {
        Self { confirm: true, max_attempts: 1, log: Arc::new(Mutex::new(WriteLog::default())) }
    }

    /// Decline large-upload confirmations.
    #[must_use]
    pub fn declining(mut self) -> Self {
        self.confirm = false;
        self
    }

    /// Retry failed uploads until `attempts` uploads were made.
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Everything recorded so far.
    pub fn log(&self) -> WriteLog {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, WriteLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WriteDriver for SimWriteDriver {
    type Error = SimDriverError;

    async fn confirm_large(&mut self, size: u64) -> Result<bool, Self::Error> {
        self.lock().confirmations.push(size);
        Ok(self.confirm)
    }

    async fn retry_upload(&mut self, error: &StoreError, attempts: u32) -> Result<bool, Self::Error> {
        tracing::debug!(%error, attempts, "upload failed in simulation");
        self.lock().retry_prompts.push(attempts);
        Ok(attempts < self.max_attempts)
    }

    fn render(&mut self, flow: &WriteFlow) -> Result<(), Self::Error> {
        let name = flow.state().name();
        let mut log = self.lock();
        if log.states.last() != Some(&name) {
            log.states.push(name);
        }
        Ok(())
    }
}
