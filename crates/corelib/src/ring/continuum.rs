//! Per-rack continuum.

use crate::error::{Error, Result};
use crate::node::Endpoint;
use crate::token::Token;

/// One node on a rack's ring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContinuumEntry {
    pub token: Token,
    /// Position in the sorted continuum; also the pool slot of this node.
    pub slot: usize,
    pub endpoint: Endpoint,
}

/// Finds the slot serving `token` in a continuum sorted ascending by token.
///
/// The answer is the first entry whose token is greater than or equal to
/// `token`. A token past the last entry wraps to the first entry, as does a
/// token at or below the first. Returns `None` only for an empty slice.
pub fn locate(entries: &[ContinuumEntry], token: &Token) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }
    let idx = entries.partition_point(|entry| entry.token < *token);
    let idx = if idx == entries.len() { 0 } else { idx };
    Some(entries[idx].slot)
}

/// Collects a rack's nodes before the ring is sealed.
///
/// Capacity is fixed when the rack is declared; registering more nodes than
/// that is an error rather than a silent overwrite.
#[derive(Clone, Debug)]
pub struct ContinuumBuilder {
    rack: String,
    capacity: usize,
    entries: Vec<(Token, Endpoint)>,
}

impl ContinuumBuilder {
    pub fn new(rack: impl Into<String>, capacity: usize) -> Self {
        Self {
            rack: rack.into(),
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn rack(&self) -> &str {
        &self.rack
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a node. Returns its registration index.
    pub fn add(&mut self, token: Token, endpoint: Endpoint) -> Result<usize> {
        if self.entries.len() >= self.capacity {
            return Err(Error::RackFull {
                rack: self.rack.clone(),
                capacity: self.capacity,
            });
        }
        self.entries.push((token, endpoint));
        Ok(self.entries.len() - 1)
    }

    /// Sorts the nodes by token and assigns slots. Two nodes with the same
    /// token make the ring ambiguous and are rejected.
    pub fn build(self) -> Result<Continuum> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::DuplicateToken {
                rack: self.rack,
                token: pair[0].0,
            });
        }
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(slot, (token, endpoint))| ContinuumEntry {
                token,
                slot,
                endpoint,
            })
            .collect();
        Ok(Continuum {
            rack: self.rack,
            entries,
        })
    }
}

/// A rack's sealed ring, sorted ascending by token.
#[derive(Clone, Debug)]
pub struct Continuum {
    rack: String,
    entries: Vec<ContinuumEntry>,
}

impl Continuum {
    pub fn rack(&self) -> &str {
        &self.rack
    }

    pub fn entries(&self) -> &[ContinuumEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&ContinuumEntry> {
        self.entries.get(slot)
    }

    /// Slot serving `token`; see [`locate`].
    pub fn locate(&self, token: &Token) -> Option<usize> {
        locate(&self.entries, token)
    }
}
