//! TOML description of a ring.
//!
//! ```toml
//! [ring]
//! weight_multiplier = 16
//! hasher = "crc32"
//!
//! [[members]]
//! id = "cache-a"
//! key = "10.0.0.1:11211"
//! weight = 2
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::hasher::HashAlgorithm;
use crate::ring::Ring;

/// Ring settings and initial membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Ring-wide settings.
    pub ring: RingSection,
    /// Members placed on the ring at build time, in order.
    pub members: Vec<MemberSection>,
}

/// `[ring]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RingSection {
    /// Virtual nodes per unit of weight. `0` or omitted means one.
    pub weight_multiplier: u32,
    /// Hash used for keys and virtual nodes.
    pub hasher: HashAlgorithm,
}

/// One `[[members]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberSection {
    /// Member identifier.
    pub id: String,
    /// Placement key. Defaults to the ID.
    #[serde(default)]
    pub key: Option<String>,
    /// Relative weight. Defaults to 1.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl MemberSection {
    /// Bytes hashed to place this member.
    pub fn key_bytes(&self) -> &[u8] {
        self.key.as_deref().unwrap_or(&self.id).as_bytes()
    }
}

impl RingConfig {
    /// Load a ring description from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a ring description from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Build a ring with every configured member on it.
    ///
    /// Fails on a zero weight or a repeated member ID.
    pub fn build(&self) -> Result<Ring<HashAlgorithm>, ConfigError> {
        let mut ring = Ring::with_hasher(self.ring.hasher)
            .with_weight_multiplier(self.ring.weight_multiplier);

        for member in &self.members {
            if !ring.add(&member.id, member.key_bytes(), member.weight)? {
                return Err(ConfigError::DuplicateMember(member.id.clone()));
            }
        }

        info!(
            members = ring.member_count(),
            vnodes = ring.vnode_count(),
            hasher = %self.ring.hasher,
            "built ring from config"
        );
        Ok(ring)
    }
}
