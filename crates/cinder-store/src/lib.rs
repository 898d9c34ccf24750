//! Paste store backends
//!
//! Implementations of [`cinder_core::PasteStore`]:
//!
//! - [`MemoryStore`]: shared in-memory map, used by simulation and tests
//! - [`ChaoticStore`]: wrapper that injects failures for chaos testing
//! - [`RedbStore`]: durable store backed by redb
//!
//! Every backend issues content-addressed handles
//! ([`cinder_core::Handle::for_envelope`]), rejects empty envelopes, treats
//! entries at or past their expiry as absent, and deletes idempotently.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chaotic;
mod memory;
mod redb;

pub use chaotic::{ChaoticStore, StoreOp};
pub use memory::{MemoryStore, StoreStats};

pub use self::redb::RedbStore;

/// Returns true while an entry with this deadline is still readable.
fn is_live(expires_at: u64, now_secs: u64) -> bool {
    now_secs < expires_at
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_is_exclusive() {
        assert!(is_live(100, 99));
        assert!(!is_live(100, 100));
        assert!(!is_live(100, 101));
    }
}
