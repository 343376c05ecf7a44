//! Consistent hash ring implementation.
//!
//! Each rack owns one [`Continuum`]: its nodes sorted by token. A key is
//! served by the first node whose token is at or after the key's token,
//! wrapping around to the first node past the end of the ring.

pub mod continuum;

pub use continuum::{locate, Continuum, ContinuumBuilder, ContinuumEntry};
