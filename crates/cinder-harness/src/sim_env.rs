//! Simulated environment.
//!
//! Monotonic time and sleeping come from tokio's clock, which tests pause so
//! timers fire instantly and in order. Randomness is a seeded ChaCha8 stream
//! and the wall clock only moves when a test moves it.

#![allow(clippy::disallowed_types, reason = "RNG lock is never held across an await")]

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use cinder_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall clock every simulation starts at (2024-01-01T00:00:00Z).
pub const EPOCH_SECS: u64 = 1_704_067_200;

/// Deterministic environment for simulation.
///
/// Clones share the RNG and the wall clock.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
    wall_clock: Arc<AtomicU64>,
}

impl SimEnv {
    /// Environment seeded with `seed`, wall clock at [`EPOCH_SECS`].
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            wall_clock: Arc::new(AtomicU64::new(EPOCH_SECS)),
        }
    }

    /// Move the wall clock forward. Expiry checks see the new time at once.
    pub fn advance_wall_clock(&self, by: Duration) {
        self.wall_clock.fetch_add(by.as_secs(), Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }

    fn wall_clock_secs(&self) -> u64 {
        self.wall_clock.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let (a, b) = (SimEnv::with_seed(7), SimEnv::with_seed(7));
        let (mut x, mut y) = ([0u8; 16], [0u8; 16]);
        a.random_bytes(&mut x);
        b.random_bytes(&mut y);
        assert_eq!(x, y);

        let c = SimEnv::with_seed(8);
        c.random_bytes(&mut y);
        assert_ne!(x, y);
    }

    #[test]
    fn clones_share_wall_clock() {
        let env = SimEnv::with_seed(0);
        let clone = env.clone();
        clone.advance_wall_clock(Duration::from_secs(600));
        assert_eq!(env.wall_clock_secs(), EPOCH_SECS + 600);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_follows_paused_clock() {
        let env = SimEnv::with_seed(0);
        let start = env.now();
        env.sleep(Duration::from_secs(30)).await;
        assert_eq!(env.now() - start, Duration::from_secs(30));
    }
}
