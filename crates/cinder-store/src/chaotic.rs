//! Chaotic store wrapper for fault injection testing
//!
//! Wraps another store and fails operations at random (seeded, reproducible)
//! or on demand, to exercise retry and warning paths in the read lifecycle.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use cinder_core::{Handle, Paste, PasteStore, StoreError};

/// Store operation selector for scripted failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// `create`
    Create,
    /// `fetch`
    Fetch,
    /// `delete`
    Delete,
}

/// Store wrapper that injects failures.
///
/// Two independent fault sources:
///
/// - a failure rate driven by a seeded LCG, applied to every operation
/// - scripted counters ([`ChaoticStore::fail_next`]) that fail the next `n`
///   calls of one operation regardless of the rate
///
/// A failed operation never reaches the inner store.
#[derive(Clone)]
pub struct ChaoticStore<S: PasteStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    scripted: Arc<[AtomicUsize; 3]>,
    operation_count: Arc<AtomicUsize>,
    injected_count: Arc<AtomicUsize>,
}

/// Linear congruential generator; reproducible for a given seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: PasteStore> ChaoticStore<S> {
    /// Wrap `inner` with the default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Wrap `inner` with an explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            scripted: Arc::new([AtomicUsize::new(0), AtomicUsize::new(0), AtomicUsize::new(0)]),
            operation_count: Arc::new(AtomicUsize::new(0)),
            injected_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the next `n` calls of `op`, on top of the random rate.
    pub fn fail_next(&self, op: StoreOp, n: usize) {
        self.scripted[op as usize].store(n, Ordering::SeqCst);
    }

    /// Underlying store (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total operations attempted through this wrapper.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::SeqCst)
    }

    /// Operations that were failed on purpose.
    pub fn injected_failures(&self) -> usize {
        self.injected_count.load(Ordering::SeqCst)
    }

    fn inject(&self, op: StoreOp) -> Result<(), StoreError> {
        self.operation_count.fetch_add(1, Ordering::SeqCst);

        let scripted = self.scripted[op as usize]
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        let random = !scripted
            && self.rng.lock().unwrap_or_else(PoisonError::into_inner).next() < self.failure_rate;

        if scripted || random {
            self.injected_count.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(?op, scripted, "injecting store failure");
            return Err(StoreError::Io(format!("chaotic {op:?} failure")));
        }
        Ok(())
    }
}

impl<S: PasteStore> PasteStore for ChaoticStore<S> {
    async fn create(&self, paste: Paste, expires_at: u64) -> Result<Handle, StoreError> {
        self.inject(StoreOp::Create)?;
        self.inner.create(paste, expires_at).await
    }

    async fn fetch(&self, handle: &Handle) -> Result<Option<Paste>, StoreError> {
        self.inject(StoreOp::Fetch)?;
        self.inner.fetch(handle).await
    }

    async fn delete(&self, handle: &Handle) -> Result<(), StoreError> {
        self.inject(StoreOp::Delete)?;
        self.inner.delete(handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, test_env::ClockEnv};

    fn memory() -> MemoryStore<ClockEnv> {
        MemoryStore::new(ClockEnv::at(0))
    }

    fn paste(bytes: &[u8]) -> Paste {
        Paste::new("text/plain", bytes.to_vec())
    }

    #[tokio::test]
    async fn zero_failure_rate_passes_through() {
        let chaotic = ChaoticStore::new(memory(), 0.0);

        for i in 0..50u8 {
            let handle = chaotic.create(paste(&[i + 1]), 10).await.unwrap();
            assert!(chaotic.fetch(&handle).await.unwrap().is_some());
        }
        assert_eq!(chaotic.injected_failures(), 0);
        assert_eq!(chaotic.operation_count(), 100);
    }

    #[tokio::test]
    async fn full_failure_rate_always_fails() {
        let chaotic = ChaoticStore::new(memory(), 1.0);

        assert!(chaotic.create(paste(b"x"), 10).await.is_err());
        assert!(chaotic.fetch(&Handle::new("h")).await.is_err());
        assert!(chaotic.delete(&Handle::new("h")).await.is_err());
        assert!(chaotic.inner().is_empty());
    }

    #[tokio::test]
    async fn deterministic_with_seed() {
        async fn outcomes(seed: u64) -> Vec<bool> {
            let chaotic = ChaoticStore::with_seed(memory(), 0.5, seed);
            let mut out = Vec::new();
            for _ in 0..32 {
                out.push(chaotic.delete(&Handle::new("h")).await.is_ok());
            }
            out
        }

        assert_eq!(outcomes(7).await, outcomes(7).await);
        assert_ne!(outcomes(7).await, outcomes(8).await);
    }

    #[tokio::test]
    async fn scripted_failures_target_one_operation() {
        let chaotic = ChaoticStore::new(memory(), 0.0);
        let handle = chaotic.create(paste(b"x"), 10).await.unwrap();

        chaotic.fail_next(StoreOp::Delete, 2);

        assert!(chaotic.fetch(&handle).await.is_ok());
        assert!(chaotic.delete(&handle).await.is_err());
        assert!(chaotic.delete(&handle).await.is_err());
        assert!(chaotic.inner().contains(&handle), "failed deletes never reach the store");

        assert!(chaotic.delete(&handle).await.is_ok());
        assert!(!chaotic.inner().contains(&handle));
        assert_eq!(chaotic.injected_failures(), 2);
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between 0.0 and 1.0")]
    fn rejects_invalid_failure_rate() {
        let _ = ChaoticStore::new(memory(), 1.5);
    }
}
