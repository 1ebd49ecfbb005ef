//! Error type shared by the spatial structures
//!
//! Only programmer errors end up here. Numeric edge cases (parallel rays,
//! degenerate triangles, zero-length segments) are answered with `None`,
//! `false` or `Disjoint` by the geometry routines instead.

use crate::config::ConfigError;
use crate::dynamic_tree::ProxyId;

/// Errors reported by the spatial structures
#[derive(thiserror::Error, Debug)]
pub enum SpatialError {
    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation that needs at least one input received none
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    /// The proxy id does not name a live leaf of this tree
    #[error("Invalid proxy: {0:?}")]
    InvalidProxy(ProxyId),

    /// The node key does not belong to this partition tree
    #[error("Node does not belong to this tree")]
    UnknownNode,

    /// The object already carries spatial data from an earlier add
    #[error("Object is already indexed")]
    AlreadyIndexed,

    /// The object is not stored in any collection
    #[error("Object is not indexed")]
    NotIndexed,

    /// The object is indexed by a different collection
    #[error("Object belongs to another collection")]
    ForeignItem,

    /// A caller supplied buffer cannot hold the produced data
    #[error("Buffer too small: need {needed} slots, {available} available")]
    BufferTooSmall {
        /// Slots required
        needed: usize,
        /// Slots available after the requested offset
        available: usize,
    },

    /// A structural invariant check failed
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Loading or saving configuration failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SpatialError>;
