//! TOML configuration for the `spindle` CLI.
//!
//! The ring description (`[ring]`, `[[members]]`) is shared with the library;
//! this file adds the `[log]` section. Without a config file the ring starts
//! empty and members can be supplied on the command line.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use spindle_ring::{MemberSection, RingConfig};

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Ring settings and members.
    #[serde(flatten)]
    pub placement: RingConfig,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or start empty if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("reading {}", p.display()))?;
                Self::from_toml(&content).with_context(|| format!("parsing {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string.
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Parse a member given on the command line: `ID[:WEIGHT][=KEY]`.
///
/// The key defaults to the ID and the weight to 1.
pub fn parse_member(arg: &str) -> anyhow::Result<MemberSection> {
    let (head, key) = match arg.split_once('=') {
        Some((head, key)) => (head, Some(key.to_string())),
        None => (arg, None),
    };
    let (id, weight) = match head.split_once(':') {
        Some((id, weight)) => {
            let weight = weight
                .parse::<u32>()
                .with_context(|| format!("invalid weight in member {arg:?}"))?;
            (id, weight)
        }
        None => (head, 1),
    };
    anyhow::ensure!(!id.is_empty(), "empty member id in {arg:?}");

    Ok(MemberSection {
        id: id.to_string(),
        key,
        weight,
    })
}
