//! Error types for ring construction and configuration.

/// Errors produced when a member cannot be placed on the ring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// The member was given a weight of zero and would own no virtual nodes.
    #[error("member {id} has zero weight")]
    ZeroWeight {
        /// Member identifier.
        id: String,
    },

    /// `weight × multiplier` exceeds the per-member virtual node limit.
    #[error("member {id} needs {weight} x {multiplier} virtual nodes, more than the limit of {limit}")]
    TooManyVirtualNodes {
        /// Member identifier.
        id: String,
        /// Requested weight.
        weight: u32,
        /// Effective ring multiplier.
        multiplier: u32,
        /// Most virtual nodes one member may own.
        limit: u32,
    },
}

/// Errors produced while loading a ring description from TOML.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML document is malformed or has the wrong shape.
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two `[[members]]` entries share an identifier.
    #[error("duplicate member id: {0}")]
    DuplicateMember(String),

    /// A member was rejected by the ring.
    #[error("invalid member: {0}")]
    Member(#[from] RingError),
}
