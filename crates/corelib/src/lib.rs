//! Core library for ring routing.
//!
//! This crate holds the connection-free half of the client:
//! - Tokens: the ring coordinates
//! - Partitioners: named key hashes producing tokens
//! - Continuum: per-rack sorted rings and successor lookup
//! - Endpoints and the static datacenter/rack/node description

pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod topology;

pub use error::{Error, Result};
pub use node::Endpoint;
pub use partitioner::{HashKind, HashPartitioner, HashResolution, Partitioner};
pub use ring::{Continuum, ContinuumBuilder, ContinuumEntry};
pub use token::{Token, TokenError};
pub use topology::{DatacenterConfig, DatacenterKind, NodeConfig, RackConfig};
