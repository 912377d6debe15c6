//! Hash functions that position keys and virtual nodes on the ring.
//!
//! The ring's coordinate space is `u32`. Whatever hasher a ring is built with
//! must be deterministic: the same bytes always land on the same position,
//! across processes and across machines, or placement stops being stable.

use std::fmt;

use serde::Deserialize;

/// Maps an arbitrary byte string to a position on the ring.
pub trait KeyHasher: Send + Sync {
    /// Hash `key` to a ring position.
    fn hash(&self, key: &[u8]) -> u32;
}

impl<F> KeyHasher for F
where
    F: Fn(&[u8]) -> u32 + Send + Sync,
{
    fn hash(&self, key: &[u8]) -> u32 {
        self(key)
    }
}

/// IEEE CRC-32. The default ring hasher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32;

impl KeyHasher for Crc32 {
    fn hash(&self, key: &[u8]) -> u32 {
        crc32fast::hash(key)
    }
}

/// First four bytes of the BLAKE3 digest, little-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3;

impl KeyHasher for Blake3 {
    fn hash(&self, key: &[u8]) -> u32 {
        let digest = blake3::hash(key);
        let b = digest.as_bytes();
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }
}

/// Hasher selected at runtime, e.g. from a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// See [`Crc32`].
    #[default]
    Crc32,
    /// See [`Blake3`].
    Blake3,
}

impl KeyHasher for HashAlgorithm {
    fn hash(&self, key: &[u8]) -> u32 {
        match self {
            Self::Crc32 => Crc32.hash(key),
            Self::Blake3 => Blake3.hash(key),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crc32 => f.write_str("crc32"),
            Self::Blake3 => f.write_str("blake3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_matches_ieee_check_value() {
        // Standard CRC-32/ISO-HDLC check value.
        assert_eq!(Crc32.hash(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_crc32_known_member_keys() {
        assert_eq!(Crc32.hash(b"<key-1>"), 3_771_742_016);
        assert_eq!(Crc32.hash(b"<key-2>"), 3_422_381_187);
        assert_eq!(Crc32.hash(b"<key-3>"), 3_538_310_594);
        assert_eq!(Crc32.hash(b"<key-1>\0"), 2_755_558_954);
    }

    #[test]
    fn test_blake3_is_deterministic_and_differs_from_crc() {
        let a = Blake3.hash(b"member");
        assert_eq!(a, Blake3.hash(b"member"));
        assert_ne!(Blake3.hash(b"member"), Blake3.hash(b"member\0"));
        assert_ne!(a, Crc32.hash(b"member"));
    }

    #[test]
    fn test_hash_algorithm_dispatch() {
        assert_eq!(HashAlgorithm::Crc32.hash(b"k"), Crc32.hash(b"k"));
        assert_eq!(HashAlgorithm::Blake3.hash(b"k"), Blake3.hash(b"k"));
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Crc32);
        assert_eq!(HashAlgorithm::Blake3.to_string(), "blake3");
    }

    #[test]
    fn test_closure_hasher() {
        let constant = |_: &[u8]| 7u32;
        assert_eq!(constant.hash(b"anything"), 7);
    }
}
