//! Redb-backed durable paste store.
//!
//! Uses redb's ACID transactions; pastes survive restarts until deleted or
//! expired. Transactions block on disk I/O, so every operation runs on
//! tokio's blocking pool.

use std::{path::Path, sync::Arc};

use cinder_core::{Environment, Handle, Paste, PasteStore, StoreError};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::is_live;

/// Table: envelopes
/// Key: handle text
/// Value: raw envelope bytes
const ENVELOPES: TableDefinition<&str, &[u8]> = TableDefinition::new("envelopes");

/// Table: meta
/// Key: handle text
/// Value: CBOR-encoded `StoredMeta`
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Per-paste metadata kept beside the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredMeta {
    content_type: String,
    /// Unix seconds; unreadable from this instant on.
    expires_at: u64,
}

/// Durable store backed by redb.
///
/// Thread-safe through redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStore<E: Environment> {
    db: Arc<Database>,
    env: E,
}

fn io(err: impl std::fmt::Display) -> StoreError {
    StoreError::Io(err.to_string())
}

impl<E: Environment> RedbStore<E> {
    /// Open or create a redb database at the given path.
    ///
    /// Creates the ENVELOPES and META tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>, env: E) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        let txn = db.begin_write().map_err(io)?;
        {
            let _ = txn.open_table(ENVELOPES).map_err(io)?;
            let _ = txn.open_table(META).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(Self { db: Arc::new(db), env })
    }

    /// Remove every entry whose expiry has passed. Returns how many were
    /// removed.
    ///
    /// Reads already treat expired entries as absent; this only reclaims
    /// space. The expiry check and the removal share one write transaction,
    /// so an entry re-created concurrently is never removed.
    pub async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = self.env.wall_clock_secs();

        let purged = self
            .blocking(move |db| {
                let txn = db.begin_write().map_err(io)?;
                let purged = {
                    let mut envelopes = txn.open_table(ENVELOPES).map_err(io)?;
                    let mut meta = txn.open_table(META).map_err(io)?;

                    let mut expired = Vec::new();
                    for entry in meta.iter().map_err(io)? {
                        let (key, value) = entry.map_err(io)?;
                        let handle = Handle::new(key.value());
                        let record = decode_meta(&handle, value.value())?;
                        if !is_live(record.expires_at, now) {
                            expired.push(handle);
                        }
                    }

                    for handle in &expired {
                        envelopes.remove(handle.as_str()).map_err(io)?;
                        meta.remove(handle.as_str()).map_err(io)?;
                    }
                    expired.len()
                };
                txn.commit().map_err(io)?;
                Ok(purged)
            })
            .await?;

        if purged > 0 {
            tracing::info!(count = purged, "purged expired pastes");
        }
        Ok(purged)
    }

    /// Run `op` against the database on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db)).await.map_err(io)?
    }
}

impl<E: Environment> PasteStore for RedbStore<E> {
    async fn create(&self, paste: Paste, expires_at: u64) -> Result<Handle, StoreError> {
        if paste.is_empty() {
            return Err(StoreError::EmptyEnvelope);
        }

        let handle = Handle::for_envelope(paste.envelope());
        let len = paste.len();
        let (content_type, envelope) = paste.into_parts();

        let record = StoredMeta { content_type, expires_at };
        let mut meta_bytes = Vec::new();
        ciborium::into_writer(&record, &mut meta_bytes).map_err(io)?;

        let key = handle.clone();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(io)?;
            {
                let mut envelopes = txn.open_table(ENVELOPES).map_err(io)?;
                envelopes.insert(key.as_str(), &envelope[..]).map_err(io)?;

                let mut meta = txn.open_table(META).map_err(io)?;
                meta.insert(key.as_str(), meta_bytes.as_slice()).map_err(io)?;
            }
            txn.commit().map_err(io)
        })
        .await?;

        tracing::info!(%handle, content_type = %record.content_type, len, expires_at, "create");
        Ok(handle)
    }

    async fn fetch(&self, handle: &Handle) -> Result<Option<Paste>, StoreError> {
        let now = self.env.wall_clock_secs();
        let handle = handle.clone();

        self.blocking(move |db| {
            let txn = db.begin_read().map_err(io)?;

            let meta = txn.open_table(META).map_err(io)?;
            let Some(meta_bytes) = meta.get(handle.as_str()).map_err(io)? else {
                tracing::debug!(%handle, "fetch: not found");
                return Ok(None);
            };
            let record = decode_meta(&handle, meta_bytes.value())?;

            if !is_live(record.expires_at, now) {
                tracing::debug!(%handle, "fetch: expired");
                return Ok(None);
            }

            let envelopes = txn.open_table(ENVELOPES).map_err(io)?;
            let Some(envelope) = envelopes.get(handle.as_str()).map_err(io)? else {
                return Err(StoreError::Corrupt {
                    handle: handle.clone(),
                    reason: "metadata without envelope".to_string(),
                });
            };

            Ok(Some(Paste::new(record.content_type, envelope.value().to_vec())))
        })
        .await
    }

    async fn delete(&self, handle: &Handle) -> Result<(), StoreError> {
        let key = handle.clone();
        let existed = self
            .blocking(move |db| {
                let txn = db.begin_write().map_err(io)?;
                let existed = {
                    let mut envelopes = txn.open_table(ENVELOPES).map_err(io)?;
                    let mut meta = txn.open_table(META).map_err(io)?;
                    let envelope = envelopes.remove(key.as_str()).map_err(io)?.is_some();
                    let record = meta.remove(key.as_str()).map_err(io)?.is_some();
                    envelope || record
                };
                txn.commit().map_err(io)?;
                Ok(existed)
            })
            .await?;

        tracing::info!(%handle, existed, "delete");
        Ok(())
    }
}

fn decode_meta(handle: &Handle, bytes: &[u8]) -> Result<StoredMeta, StoreError> {
    ciborium::from_reader(bytes)
        .map_err(|e| StoreError::Corrupt { handle: handle.clone(), reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::test_env::ClockEnv;

    fn paste(content_type: &str, bytes: &[u8]) -> Paste {
        Paste::new(content_type, bytes.to_vec())
    }

    #[test]
    fn meta_cbor_roundtrip() {
        let meta = StoredMeta { content_type: "image/png".into(), expires_at: 42 };
        let mut bytes = Vec::new();
        ciborium::into_writer(&meta, &mut bytes).unwrap();

        assert_eq!(decode_meta(&Handle::new("h"), &bytes).unwrap(), meta);
    }

    #[test]
    fn corrupt_meta_is_reported() {
        let err = decode_meta(&Handle::new("h"), &[0xFF, 0x00]).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn create_fetch_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb"), ClockEnv::at(100)).unwrap();

        let handle = store.create(paste("image/png", b"\x00envelope"), 200).await.unwrap();
        assert_eq!(handle, Handle::for_envelope(b"\x00envelope"));

        let fetched = store.fetch(&handle).await.unwrap().unwrap();
        assert_eq!(fetched.content_type(), "image/png");
        assert_eq!(fetched.envelope().as_ref(), b"\x00envelope");
    }

    #[tokio::test]
    async fn empty_envelope_rejected() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb"), ClockEnv::at(0)).unwrap();

        let result = store.create(paste("text/plain", b""), 10).await;
        assert_eq!(result, Err(StoreError::EmptyEnvelope));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb"), ClockEnv::at(0)).unwrap();
        let handle = store.create(paste("text/plain", b"x"), 10).await.unwrap();

        store.delete(&handle).await.unwrap();
        store.delete(&handle).await.unwrap();

        assert_eq!(store.fetch(&handle).await, Ok(None));
    }

    #[tokio::test]
    async fn expired_entries_not_returned() {
        let dir = tempdir().unwrap();
        let env = ClockEnv::at(1_000);
        let store = RedbStore::open(dir.path().join("test.redb"), env.clone()).unwrap();
        let handle = store.create(paste("text/plain", b"x"), 1_010).await.unwrap();

        env.advance(10);
        assert_eq!(store.fetch(&handle).await, Ok(None));
    }

    #[tokio::test]
    async fn purge_reclaims_only_expired() {
        let dir = tempdir().unwrap();
        let env = ClockEnv::at(0);
        let store = RedbStore::open(dir.path().join("test.redb"), env.clone()).unwrap();

        let short = store.create(paste("text/plain", b"short"), 10).await.unwrap();
        let long = store.create(paste("text/plain", b"long"), 1_000).await.unwrap();

        env.advance(10);
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.purge_expired().await.unwrap(), 0);

        assert_eq!(store.fetch(&short).await, Ok(None));
        assert!(store.fetch(&long).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn purge_keeps_recreated_paste() {
        let dir = tempdir().unwrap();
        let env = ClockEnv::at(0);
        let store = RedbStore::open(dir.path().join("test.redb"), env.clone()).unwrap();

        let handle = store.create(paste("text/plain", b"again"), 10).await.unwrap();
        env.advance(10);

        // Same content re-uploaded after expiry: same handle, fresh lifetime
        let again = store.create(paste("text/plain", b"again"), 100).await.unwrap();
        assert_eq!(again, handle);

        assert_eq!(store.purge_expired().await.unwrap(), 0);
        assert!(store.fetch(&handle).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn operations_run_off_the_async_workers() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb"), ClockEnv::at(0)).unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0u8..8 {
            let store = store.clone();
            tasks.spawn(async move {
                let handle = store.create(paste("text/plain", &[i; 64]), 100).await.unwrap();
                store.fetch(&handle).await.unwrap().unwrap();
                store.delete(&handle).await.unwrap();
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");

        let handle = {
            let store = RedbStore::open(&path, ClockEnv::at(0)).unwrap();
            store.create(paste("text/plain", b"durable"), 100).await.unwrap()
        };

        let store = RedbStore::open(&path, ClockEnv::at(50)).unwrap();
        let fetched = store.fetch(&handle).await.unwrap().unwrap();
        assert_eq!(fetched.envelope().as_ref(), b"durable");
    }
}
