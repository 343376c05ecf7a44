//! Error types for the core library.

use crate::token::{Token, TokenError};
use crate::topology::DatacenterKind;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while describing or building a ring topology.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A ring token could not be parsed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    /// No hash function is registered under this name.
    #[error("unknown hash function: {0}")]
    UnknownHash(String),

    /// Two nodes of the same rack were given the same ring token.
    #[error("duplicate token {token} in rack {rack}")]
    DuplicateToken { rack: String, token: Token },

    /// More nodes were registered than the rack was sized for.
    #[error("rack {rack} is full ({capacity} nodes)")]
    RackFull { rack: String, capacity: usize },

    /// More racks were registered than the datacenter was sized for.
    #[error("datacenter {datacenter} is full ({capacity} racks)")]
    DatacenterFull { datacenter: String, capacity: usize },

    /// A rack name was registered twice in one datacenter.
    #[error("rack {rack} already exists in datacenter {datacenter}")]
    DuplicateRack { datacenter: String, rack: String },

    /// A node referenced a rack that was never added.
    #[error("unknown rack {rack} in {kind} datacenter")]
    UnknownRack { kind: DatacenterKind, rack: String },

    /// The datacenter of this kind was never added.
    #[error("{0} datacenter is not configured")]
    DatacenterUnconfigured(DatacenterKind),

    /// Static configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
