//! Scenario world: one store, one clock, any number of writers and readers.
//!
//! Readers and writers run through the production runtimes. Call from a test
//! running on tokio's paused clock so burn timers fire instantly.

use cinder_app::{AppConfig, ReadRuntime, ReadSession, RuntimeError, WriteRequest, WriteRuntime};
use cinder_core::Handle;
use cinder_store::{ChaoticStore, MemoryStore};

use crate::{
    invariants::{InvariantRegistry, SessionTrace},
    sim_driver::{SimDriverError, SimReadDriver, SimWriteDriver, Step},
    sim_env::SimEnv,
};

/// Store under test: in-memory, behind a fault injector.
pub type SimStore = ChaoticStore<MemoryStore<SimEnv>>;

/// Shared simulation state.
pub struct World {
    /// Clock and RNG.
    pub env: SimEnv,
    /// Store as seen by runtimes.
    pub store: SimStore,
    /// Configuration every runtime gets.
    pub config: AppConfig,
}

/// Result of one read.
#[derive(Debug)]
pub struct ReadOutcome {
    /// Session as the runtime returned it, or the driver error.
    pub result: Result<ReadSession, RuntimeError<SimDriverError>>,
    /// Rendered snapshots, plus the final one after outstanding deletes.
    pub trace: SessionTrace,
    /// Steps the script never got to play.
    pub unplayed_steps: usize,
}

impl ReadOutcome {
    /// Finished session.
    ///
    /// # Panics
    ///
    /// Panics if the read failed.
    #[allow(clippy::panic, reason = "test helper")]
    pub fn session(&self) -> &ReadSession {
        match &self.result {
            Ok(session) => session,
            Err(err) => panic!("read failed: {err} (trace: {})", self.trace),
        }
    }
}

impl World {
    /// Fault-free world.
    pub fn new(seed: u64) -> Self {
        Self::chaotic(seed, 0.0)
    }

    /// World whose store fails operations at `failure_rate`.
    pub fn chaotic(seed: u64, failure_rate: f64) -> Self {
        let env = SimEnv::with_seed(seed);
        let store = ChaoticStore::with_seed(MemoryStore::new(env.clone()), failure_rate, seed);
        Self { env, store, config: AppConfig::default() }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Underlying memory store, bypassing fault injection.
    pub fn memory(&self) -> &MemoryStore<SimEnv> {
        self.store.inner()
    }

    /// Publish with a writer that confirms and does not retry.
    pub async fn publish(
        &self,
        request: WriteRequest,
    ) -> Result<(Handle, String), RuntimeError<SimDriverError>> {
        self.publish_with(SimWriteDriver::new(), request).await
    }

    /// Publish with a custom writer.
    pub async fn publish_with(
        &self,
        driver: SimWriteDriver,
        request: WriteRequest,
    ) -> Result<(Handle, String), RuntimeError<SimDriverError>> {
        let runtime =
            WriteRuntime::new(driver, self.store.clone(), self.env.clone(), self.config.clone());
        runtime.run(request).await
    }

    /// Read `handle` with a scripted reader, checking the standard invariants
    /// on every render and once more after outstanding deletes settle.
    pub async fn read(&self, handle: &Handle, steps: impl IntoIterator<Item = Step>) -> ReadOutcome {
        self.read_with(SimReadDriver::new(steps), handle).await
    }

    /// Read with a prepared driver.
    pub async fn read_with(&self, driver: SimReadDriver, handle: &Handle) -> ReadOutcome {
        let driver = driver.with_invariants(InvariantRegistry::standard());
        let observer = driver.clone();

        let runtime = ReadRuntime::new(
            driver,
            self.store.clone(),
            self.env.clone(),
            handle.clone(),
            &self.config,
        );
        let result = runtime.run().await;
        self.finish(observer, result)
    }

    /// Read, cancelling the runtime once `cancel_when` holds for the trace.
    pub async fn read_until(
        &self,
        driver: SimReadDriver,
        handle: &Handle,
        cancel_when: impl Fn(&SessionTrace) -> bool,
    ) -> ReadOutcome {
        let driver = driver.with_invariants(InvariantRegistry::standard());
        let observer = driver.clone();

        let runtime = ReadRuntime::new(
            driver,
            self.store.clone(),
            self.env.clone(),
            handle.clone(),
            &self.config,
        );
        let token = runtime.cancellation_token();
        let task = tokio::spawn(runtime.run());

        while !cancel_when(&observer.trace()) && !task.is_finished() {
            tokio::task::yield_now().await;
        }
        token.cancel();

        let result = match task.await {
            Ok(result) => result,
            Err(err) => Err(RuntimeError::Stalled(if err.is_panic() { "panicked" } else { "aborted" })),
        };
        self.finish(observer, result)
    }

    fn finish(
        &self,
        observer: SimReadDriver,
        result: Result<ReadSession, RuntimeError<SimDriverError>>,
    ) -> ReadOutcome {
        let mut trace = observer.trace();
        if let Ok(session) = &result {
            trace.push(session.snapshot());
            InvariantRegistry::standard().assert_all(&trace, "after settle");
        }
        ReadOutcome { result, trace, unplayed_steps: observer.remaining_steps() }
    }
}
