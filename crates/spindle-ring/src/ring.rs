//! Consistent hashing ring implementation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, LazyLock};

use tracing::{debug, trace};

use crate::error::RingError;
use crate::hasher::{Crc32, KeyHasher};

/// Size of the ring's coordinate space.
const HASH_SPACE: f64 = 4_294_967_296.0;

/// Most virtual nodes a single member may own.
pub const MAX_VIRTUAL_NODES: u32 = 1 << 16;

/// Owner of the search sentinel used when walking the ring.
static NO_OWNER: LazyLock<Arc<str>> = LazyLock::new(|| Arc::from(""));

/// One position on the ring owned by a member.
///
/// Virtual nodes are ordered by hash ascending, then owner weight descending,
/// then owner ID ascending. When two members land on the same hash, the
/// heavier member wins; equal weights fall back to the smaller ID. The order
/// never depends on insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    /// Ring position.
    pub hash: u32,
    /// Weight of the owning member.
    pub weight: u32,
    /// Owning member ID.
    pub owner: Arc<str>,
}

impl Ord for VirtualNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash
            .cmp(&other.hash)
            .then_with(|| other.weight.cmp(&self.weight))
            .then_with(|| self.owner.cmp(&other.owner))
    }
}

impl PartialOrd for VirtualNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A member currently on the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Bytes hashed to place this member's virtual nodes.
    pub key: Vec<u8>,
    /// Relative placement weight.
    pub weight: u32,
    /// Number of virtual nodes requested at insertion (`weight × multiplier`).
    pub replicas: u32,
    /// Positions of this member's virtual nodes, in replica order.
    pub hashes: Vec<u32>,
}

/// A key whose owner set changed between two ring states.
///
/// At least one side is set. `from` is `None` when the key gained a copy
/// (the owner set grew); `to` is `None` when a copy was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// The key that must move.
    pub key: Vec<u8>,
    /// The member that owned it before the change.
    pub from: Option<String>,
    /// The member that owns it after the change.
    pub to: Option<String>,
}

/// Weighted consistent hashing ring.
///
/// Each member owns `weight × multiplier` virtual nodes on a `u32` ring. A key
/// belongs to the owner of the first virtual node at or after the key's hash,
/// wrapping around past the largest position.
#[derive(Debug, Clone)]
pub struct Ring<H = Crc32> {
    /// Virtual nodes in ring order.
    vnodes: BTreeSet<VirtualNode>,
    /// Members keyed by ID.
    members: BTreeMap<Arc<str>, Member>,
    /// Virtual nodes per unit of weight. Zero means one.
    weight_multiplier: u32,
    hasher: H,
}

impl Ring<Crc32> {
    /// Create an empty ring hashed with CRC-32 and a multiplier of one.
    pub fn new() -> Self {
        Self::with_hasher(Crc32)
    }
}

impl Default for Ring<Crc32> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: KeyHasher> Ring<H> {
    /// Create an empty ring using `hasher` for both keys and virtual nodes.
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            vnodes: BTreeSet::new(),
            members: BTreeMap::new(),
            weight_multiplier: 1,
            hasher,
        }
    }

    /// Set the number of virtual nodes per unit of weight.
    ///
    /// Zero is treated as one. Only members added afterwards are affected.
    pub fn with_weight_multiplier(mut self, multiplier: u32) -> Self {
        self.weight_multiplier = multiplier;
        self
    }

    /// The configured weight multiplier, as given.
    pub fn weight_multiplier(&self) -> u32 {
        self.weight_multiplier
    }

    fn effective_multiplier(&self) -> u32 {
        self.weight_multiplier.max(1)
    }

    /// Add a member to the ring.
    ///
    /// Places `weight × multiplier` virtual nodes at `hash(key)`,
    /// `hash(key ++ [0])`, `hash(key ++ [0, 0])`, and so on. Returns
    /// `Ok(false)` without touching the ring if `id` is already present.
    ///
    /// A member may own at most [`MAX_VIRTUAL_NODES`] virtual nodes.
    pub fn add(&mut self, id: &str, key: &[u8], weight: u32) -> Result<bool, RingError> {
        if weight == 0 {
            return Err(RingError::ZeroWeight { id: id.to_string() });
        }

        let multiplier = self.effective_multiplier();
        let replicas = weight
            .checked_mul(multiplier)
            .filter(|&n| n <= MAX_VIRTUAL_NODES)
            .ok_or_else(|| RingError::TooManyVirtualNodes {
                id: id.to_string(),
                weight,
                multiplier,
                limit: MAX_VIRTUAL_NODES,
            })?;

        if self.members.contains_key(id) {
            return Ok(false);
        }

        let owner: Arc<str> = Arc::from(id);
        let hashes = replica_hashes(&self.hasher, key, replicas);
        for &hash in &hashes {
            self.vnodes.insert(VirtualNode {
                hash,
                weight,
                owner: Arc::clone(&owner),
            });
        }

        self.members.insert(
            owner,
            Member {
                key: key.to_vec(),
                weight,
                replicas,
                hashes,
            },
        );
        debug!(id, weight, replicas, "added member to ring");
        Ok(true)
    }

    /// Remove a member and all of its virtual nodes.
    ///
    /// Returns `false` if the member was not on the ring.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some((owner, member)) = self.members.remove_entry(id) else {
            return false;
        };

        for &hash in &member.hashes {
            self.vnodes.remove(&VirtualNode {
                hash,
                weight: member.weight,
                owner: Arc::clone(&owner),
            });
        }
        debug!(id, "removed member from ring");
        true
    }

    /// Find the member responsible for `key`.
    ///
    /// Returns `None` only when the ring is empty.
    pub fn get(&self, key: &[u8]) -> Option<&str> {
        let hash = self.hasher.hash(key);
        let owner = self.walk(hash).next().map(|node| &*node.owner);
        trace!(hash, ?owner, "ring lookup");
        owner
    }

    /// Rank every member by placement preference for `key`.
    ///
    /// The first element is what [`Ring::get`] returns; later elements are the
    /// fallbacks in the order they are met walking clockwise from the key.
    pub fn ordered(&self, key: &[u8]) -> Vec<&str> {
        self.owners(key, self.members.len())
    }

    /// The first `n` members of the preference list for `key`.
    ///
    /// If fewer than `n` members exist, returns all of them.
    pub fn owners(&self, key: &[u8], n: usize) -> Vec<&str> {
        let limit = n.min(self.members.len());
        let mut owners = Vec::with_capacity(limit);
        if limit == 0 {
            return owners;
        }

        let mut seen = HashSet::with_capacity(limit);
        for node in self.walk(self.hasher.hash(key)) {
            if seen.insert(&*node.owner) {
                owners.push(&*node.owner);
                if owners.len() == limit {
                    break;
                }
            }
        }

        owners
    }

    /// Every virtual node once, starting at the first one at or after `hash`.
    fn walk(&self, hash: u32) -> impl Iterator<Item = &VirtualNode> {
        // Sorts before every real node with the same hash.
        let start = VirtualNode {
            hash,
            weight: u32::MAX,
            owner: Arc::clone(&NO_OWNER),
        };
        let after = self.vnodes.range(&start..);
        let before = self.vnodes.range(..&start);
        after.chain(before)
    }

    /// Compute which keys change owners between two ring states.
    ///
    /// For each key, compares the first `replication_factor` owners in `old`
    /// and `new`. Every member that gained the key is paired with a member
    /// that lost it; gains or losses left over once one side runs out are
    /// reported unpaired. A key may appear in several migrations, always
    /// contiguously.
    pub fn diff<K: AsRef<[u8]>>(
        old: &Ring<H>,
        new: &Ring<H>,
        keys: &[K],
        replication_factor: usize,
    ) -> Vec<Migration> {
        let mut migrations = Vec::new();

        for key in keys {
            let key = key.as_ref();
            let old_owners = old.owners(key, replication_factor);
            let new_owners = new.owners(key, replication_factor);

            let mut lost = old_owners.iter().filter(|o| !new_owners.contains(*o));
            let mut gained = new_owners.iter().filter(|o| !old_owners.contains(*o));
            loop {
                let (from, to) = match (lost.next(), gained.next()) {
                    (None, None) => break,
                    (from, to) => (from, to),
                };
                migrations.push(Migration {
                    key: key.to_vec(),
                    from: from.map(|id| id.to_string()),
                    to: to.map(|id| id.to_string()),
                });
            }
        }

        migrations
    }

    /// Fraction of the hash space each member is primary for, sorted by ID.
    ///
    /// A virtual node covers every position after its predecessor up to and
    /// including its own hash. Nodes that share a hash with an earlier node
    /// cover nothing.
    pub fn coverage(&self) -> Vec<(&str, f64)> {
        let mut spans: BTreeMap<&str, u64> =
            self.members.keys().map(|id| (&**id, 0u64)).collect();

        let Some(last) = self.vnodes.last() else {
            return Vec::new();
        };

        let mut prev: Option<u32> = None;
        for node in &self.vnodes {
            let span = match prev {
                Some(p) => u64::from(node.hash - p),
                None => u64::from(node.hash) + 1 + u64::from(u32::MAX - last.hash),
            };
            if let Some(total) = spans.get_mut(&*node.owner) {
                *total += span;
            }
            prev = Some(node.hash);
        }

        spans
            .into_iter()
            .map(|(id, span)| (id, span as f64 / HASH_SPACE))
            .collect()
    }

    /// Whether `id` is on the ring.
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    /// Return info about a specific member, if present.
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.get(id)
    }

    /// All members, sorted by ID.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(id, m)| (&**id, m))
    }

    /// Return the number of members on the ring.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Return the total number of virtual nodes on the ring.
    pub fn vnode_count(&self) -> usize {
        self.vnodes.len()
    }

    /// Whether the ring has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Virtual nodes in ring order.
    pub fn vnodes(&self) -> impl Iterator<Item = &VirtualNode> {
        self.vnodes.iter()
    }

    /// The hasher used for keys and virtual nodes.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

/// Hashes of `key`, `key ++ [0]`, `key ++ [0, 0]`, ... for `replicas` entries.
fn replica_hashes<H: KeyHasher>(hasher: &H, key: &[u8], replicas: u32) -> Vec<u32> {
    let mut salted = key.to_vec();
    let mut hashes = Vec::new();
    for i in 0..replicas {
        if i > 0 {
            salted.push(0);
        }
        hashes.push(hasher.hash(&salted));
    }
    hashes
}
