//! Core partitioner trait definitions.

use crate::partitioner::registry::HashKind;
use crate::token::Token;

/// A partitioner converts keys into tokens for placement on the ring.
///
/// Partitioners are stateless and thread-safe, allowing concurrent
/// token generation without synchronization overhead.
pub trait Partitioner: Send + Sync + 'static {
    /// Converts a key into a token.
    fn partition(&self, key: &[u8]) -> Token;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}

/// Partitioner backed by one of the registered hash functions.
///
/// Key tokens are a single word: the 32-bit hash of the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashPartitioner {
    kind: HashKind,
}

impl HashPartitioner {
    pub fn new(kind: HashKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> HashKind {
        self.kind
    }
}

impl Default for HashPartitioner {
    fn default() -> Self {
        Self::new(HashKind::DEFAULT)
    }
}

impl Partitioner for HashPartitioner {
    fn partition(&self, key: &[u8]) -> Token {
        Token::from_u32(self.kind.hash(key))
    }

    fn name(&self) -> &'static str {
        self.kind.name()
    }
}
