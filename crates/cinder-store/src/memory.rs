#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use cinder_core::{Environment, Handle, Paste, PasteStore, StoreError};

use crate::is_live;

/// In-memory paste store for testing and simulation.
///
/// State lives behind `Arc<Mutex<>>`, so clones share one map. Expiry is
/// judged against the injected environment's wall clock, which lets a
/// simulation expire pastes by advancing time. Operation counters make
/// "exactly one delete was issued" assertions possible.
#[derive(Clone)]
pub struct MemoryStore<E: Environment> {
    env: E,
    records: Arc<Mutex<HashMap<Handle, Record>>>,
    counters: Arc<Counters>,
}

struct Record {
    paste: Paste,
    expires_at: u64,
}

#[derive(Default)]
struct Counters {
    creates: AtomicUsize,
    fetches: AtomicUsize,
    deletes: AtomicUsize,
}

/// Snapshot of how many operations a [`MemoryStore`] has served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// `create` calls, including rejected ones.
    pub creates: usize,
    /// `fetch` calls.
    pub fetches: usize,
    /// `delete` calls, including deletes of unknown handles.
    pub deletes: usize,
}

impl<E: Environment> MemoryStore<E> {
    /// Create an empty store reading the wall clock from `env`.
    pub fn new(env: E) -> Self {
        Self {
            env,
            records: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Operation counts so far.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            creates: self.counters.creates.load(Ordering::SeqCst),
            fetches: self.counters.fetches.load(Ordering::SeqCst),
            deletes: self.counters.deletes.load(Ordering::SeqCst),
        }
    }

    /// Returns true if `handle` is stored and not yet expired.
    pub fn contains(&self, handle: &Handle) -> bool {
        let now = self.env.wall_clock_secs();
        self.lock().get(handle).is_some_and(|record| is_live(record.expires_at, now))
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// A poisoned lock only means another test thread panicked mid-operation;
    /// the map itself is never left half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<Handle, Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Environment> PasteStore for MemoryStore<E> {
    async fn create(&self, paste: Paste, expires_at: u64) -> Result<Handle, StoreError> {
        self.counters.creates.fetch_add(1, Ordering::SeqCst);

        if paste.is_empty() {
            return Err(StoreError::EmptyEnvelope);
        }

        let handle = Handle::for_envelope(paste.envelope());
        tracing::info!(%handle, content_type = paste.content_type(), len = paste.len(), expires_at, "create");

        self.lock().insert(handle.clone(), Record { paste, expires_at });
        Ok(handle)
    }

    async fn fetch(&self, handle: &Handle) -> Result<Option<Paste>, StoreError> {
        self.counters.fetches.fetch_add(1, Ordering::SeqCst);

        let now = self.env.wall_clock_secs();
        let mut records = self.lock();

        match records.get(handle) {
            Some(record) if is_live(record.expires_at, now) => Ok(Some(record.paste.clone())),
            Some(_) => {
                tracing::debug!(%handle, "fetch: expired");
                records.remove(handle);
                Ok(None)
            },
            None => {
                tracing::debug!(%handle, "fetch: not found");
                Ok(None)
            },
        }
    }

    async fn delete(&self, handle: &Handle) -> Result<(), StoreError> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);

        let existed = self.lock().remove(handle).is_some();
        tracing::info!(%handle, existed, "delete");
        Ok(())
    }
}
