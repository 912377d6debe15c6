//! Weighted consistent hash ring for deterministic key placement.
//!
//! This crate maps keys to members of a changing, weighted set so that adding
//! or removing a member only remaps the keys that member gains or loses.
//!
//! Each member owns `weight × multiplier` virtual nodes on a `u32` ring. The
//! `i`-th virtual node sits at `hash(key ++ [0u8; i])`. A key belongs to the
//! first virtual node at or after `hash(key)`, wrapping around at the top of
//! the hash space. Virtual nodes that share a hash are ordered heavier member
//! first, then by member ID, so placement never depends on insertion order.
//!
//! - [`Ring`]: the ring and its add, remove, get and ordered operations.
//! - [`KeyHasher`], [`Crc32`], [`Blake3`], [`HashAlgorithm`]: ring hashers.
//! - [`Placement`]: the narrow trait a membership service depends on.
//! - [`SharedRing`]: a `RwLock` handle for sharing one ring across threads.
//! - [`RingConfig`]: TOML ring description.

mod config;
mod error;
mod hasher;
mod placement;
mod ring;
mod shared;

pub use config::{MemberSection, RingConfig, RingSection};
pub use error::{ConfigError, RingError};
pub use hasher::{Blake3, Crc32, HashAlgorithm, KeyHasher};
pub use placement::Placement;
pub use ring::{MAX_VIRTUAL_NODES, Member, Migration, Ring, VirtualNode};
pub use shared::SharedRing;
