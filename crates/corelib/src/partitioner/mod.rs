//! Key hashing.
//!
//! Partitioners are responsible for converting keys into tokens that can be
//! placed on the ring. The [`registry`] maps hash names, as an operator writes
//! them in configuration, to pure `fn(&[u8]) -> u32` functions.

pub mod crc;
pub mod digest;
pub mod fnv;
pub mod hsieh;
pub mod jenkins;
pub mod murmur;
pub mod one_at_a_time;
pub mod registry;
pub mod traits;

pub use registry::{HashFn, HashKind, HashResolution};
pub use traits::{HashPartitioner, Partitioner};
