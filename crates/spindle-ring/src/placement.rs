//! Narrow placement capability for callers embedding the ring.

use crate::error::RingError;
use crate::hasher::KeyHasher;
use crate::ring::Ring;

/// The four ring operations a membership service depends on.
///
/// Code that only needs placement should take `impl Placement` so tests can
/// substitute a fixed assignment.
pub trait Placement {
    /// Add a member; `Ok(false)` if it is already present.
    fn add(&mut self, id: &str, key: &[u8], weight: u32) -> Result<bool, RingError>;

    /// Remove a member; `false` if it was not present.
    fn remove(&mut self, id: &str) -> bool;

    /// Member responsible for `key`, or `None` if there are no members.
    fn get(&self, key: &[u8]) -> Option<&str>;

    /// Every member ranked by preference for `key`.
    fn ordered(&self, key: &[u8]) -> Vec<&str>;
}

impl<H: KeyHasher> Placement for Ring<H> {
    fn add(&mut self, id: &str, key: &[u8], weight: u32) -> Result<bool, RingError> {
        Ring::add(self, id, key, weight)
    }

    fn remove(&mut self, id: &str) -> bool {
        Ring::remove(self, id)
    }

    fn get(&self, key: &[u8]) -> Option<&str> {
        Ring::get(self, key)
    }

    fn ordered(&self, key: &[u8]) -> Vec<&str> {
        Ring::ordered(self, key)
    }
}
