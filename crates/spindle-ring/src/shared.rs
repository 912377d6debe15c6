//! Thread-safe handle around a [`Ring`].
//!
//! [`Ring`] itself needs `&mut self` to change membership, so a single owner
//! serializes writes for free. Services that share placement across threads
//! wrap it in a [`SharedRing`]: one writer at a time, any number of readers,
//! and lookups that return owned IDs so no lock outlives the call.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::RingError;
use crate::hasher::{Crc32, KeyHasher};
use crate::ring::Ring;

/// Cloneable, lock-protected ring shared between threads.
pub struct SharedRing<H = Crc32> {
    inner: Arc<RwLock<Ring<H>>>,
}

impl<H> Clone for SharedRing<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: KeyHasher> SharedRing<H> {
    /// Wrap an existing ring.
    pub fn new(ring: Ring<H>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ring)),
        }
    }

    /// See [`Ring::add`].
    pub fn add(&self, id: &str, key: &[u8], weight: u32) -> Result<bool, RingError> {
        self.write().add(id, key, weight)
    }

    /// See [`Ring::remove`].
    pub fn remove(&self, id: &str) -> bool {
        self.write().remove(id)
    }

    /// See [`Ring::get`].
    pub fn get(&self, key: &[u8]) -> Option<String> {
        self.read().get(key).map(str::to_string)
    }

    /// See [`Ring::ordered`].
    pub fn ordered(&self, key: &[u8]) -> Vec<String> {
        self.read().ordered(key).into_iter().map(str::to_string).collect()
    }

    /// See [`Ring::owners`].
    pub fn owners(&self, key: &[u8], n: usize) -> Vec<String> {
        self.read().owners(key, n).into_iter().map(str::to_string).collect()
    }

    /// Number of members currently on the ring.
    pub fn member_count(&self) -> usize {
        self.read().member_count()
    }

    /// Run `f` against the ring under a read lock.
    pub fn with<R>(&self, f: impl FnOnce(&Ring<H>) -> R) -> R {
        f(&self.read())
    }

    /// A point-in-time copy of the ring, e.g. to [`Ring::diff`] against later.
    pub fn snapshot(&self) -> Ring<H>
    where
        H: Clone,
    {
        self.read().clone()
    }

    // Poisoning is ignored; readers still see a usable ring.
    fn read(&self) -> RwLockReadGuard<'_, Ring<H>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ring<H>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H: KeyHasher> From<Ring<H>> for SharedRing<H> {
    fn from(ring: Ring<H>) -> Self {
        Self::new(ring)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_clones_share_state() {
        let shared = SharedRing::new(Ring::new().with_weight_multiplier(8));
        let other = shared.clone();

        assert_eq!(shared.add("node-1", b"node-1", 1), Ok(true));
        assert_eq!(other.add("node-1", b"node-1", 1), Ok(false));
        assert_eq!(other.member_count(), 1);
        assert_eq!(other.get(b"key").as_deref(), Some("node-1"));

        assert!(other.remove("node-1"));
        assert_eq!(shared.get(b"key"), None);
        assert!(shared.ordered(b"key").is_empty());
    }

    #[test]
    fn test_concurrent_readers_agree() {
        let shared = SharedRing::new(Ring::new().with_weight_multiplier(32));
        for n in 1..=4 {
            let id = format!("node-{n}");
            shared.add(&id, id.as_bytes(), 1).unwrap();
        }
        let expected: Vec<Vec<String>> = (0..200u32)
            .map(|i| shared.ordered(&i.to_le_bytes()))
            .collect();

        thread::scope(|s| {
            for _ in 0..4 {
                let shared = shared.clone();
                let expected = &expected;
                s.spawn(move || {
                    for (i, want) in (0..200u32).zip(expected) {
                        assert_eq!(&shared.ordered(&i.to_le_bytes()), want);
                    }
                });
            }
        });
    }

    #[test]
    fn test_writer_and_readers_interleave() {
        let shared = SharedRing::new(Ring::new().with_weight_multiplier(16));
        shared.add("stable", b"stable", 1).unwrap();

        thread::scope(|s| {
            let writer = shared.clone();
            s.spawn(move || {
                for n in 0..50 {
                    let id = format!("node-{n}");
                    writer.add(&id, id.as_bytes(), 1).unwrap();
                    assert!(writer.remove(&id));
                }
            });
            for _ in 0..3 {
                let reader = shared.clone();
                s.spawn(move || {
                    for i in 0..500u32 {
                        let ordered = reader.ordered(&i.to_le_bytes());
                        assert!(ordered.iter().any(|m| m == "stable"));
                        assert!(ordered.len() <= 2);
                    }
                });
            }
        });

        assert_eq!(shared.member_count(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let shared = SharedRing::from(Ring::new().with_weight_multiplier(64));
        shared.add("node-1", b"node-1", 1).unwrap();
        shared.add("node-2", b"node-2", 1).unwrap();

        let before = shared.snapshot();
        shared.add("node-3", b"node-3", 1).unwrap();

        assert_eq!(before.member_count(), 2);
        let keys: Vec<[u8; 4]> = (0..500u32).map(u32::to_le_bytes).collect();
        let migrations = shared.with(|after| Ring::diff(&before, after, &keys, 1));
        assert!(!migrations.is_empty());
        assert!(migrations.iter().all(|m| m.to.as_deref() == Some("node-3")));
    }
}
