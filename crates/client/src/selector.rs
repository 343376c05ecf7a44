//! Failover order.
//!
//! A key is tried on every rack exactly once: the racks of the local
//! datacenter in registration order, then those of the remote one. Within a
//! rack the continuum picks the slot. The walk is a plain iterator so each
//! request owns its position and nothing about it is shared.

use corelib::{DatacenterKind, Endpoint, Token};

use crate::connection::Connection;
use crate::pool::PoolEntry;
use crate::topology::Topology;

/// Position of a walk: which datacenter, which rack next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub kind: DatacenterKind,
    pub rack: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            kind: DatacenterKind::Local,
            rack: 0,
        }
    }
}

/// One pool entry a request may be sent to.
pub struct Candidate<'a, C> {
    pub kind: DatacenterKind,
    pub datacenter: &'a str,
    pub rack: &'a str,
    pub slot: usize,
    pub endpoint: &'a Endpoint,
    pub entry: &'a PoolEntry<C>,
}

/// Where a key goes at one step of its failover order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteStep {
    pub kind: DatacenterKind,
    pub datacenter: String,
    pub rack: String,
    pub slot: usize,
    pub endpoint: Endpoint,
}

impl<C> From<&Candidate<'_, C>> for RouteStep {
    fn from(candidate: &Candidate<'_, C>) -> Self {
        Self {
            kind: candidate.kind,
            datacenter: candidate.datacenter.to_owned(),
            rack: candidate.rack.to_owned(),
            slot: candidate.slot,
            endpoint: candidate.endpoint.clone(),
        }
    }
}

impl<C: Connection> Topology<C> {
    /// Advances `cursor` by one rack and returns that rack's entry for
    /// `token`. `None` once both datacenters are exhausted.
    ///
    /// Racks without nodes are stepped over; they cannot serve anything.
    pub fn select<'a>(&'a self, token: &Token, cursor: &mut Cursor) -> Option<Candidate<'a, C>> {
        loop {
            let racks = self
                .datacenter(cursor.kind)
                .map_or(0, |dc| dc.racks().len());
            if cursor.rack >= racks {
                match cursor.kind {
                    DatacenterKind::Local => {
                        cursor.kind = DatacenterKind::Remote;
                        cursor.rack = 0;
                        continue;
                    }
                    DatacenterKind::Remote => return None,
                }
            }

            // `racks > 0` above, so the datacenter exists.
            let dc = self.datacenter(cursor.kind)?;
            let rack = &dc.racks()[cursor.rack];
            cursor.rack += 1;

            let Some(slot) = rack.locate(token) else {
                continue;
            };
            let (Some(endpoint), Some(entry)) = (rack.endpoint(slot), rack.entry(slot)) else {
                continue;
            };
            return Some(Candidate {
                kind: dc.kind(),
                datacenter: dc.name(),
                rack: rack.name(),
                slot,
                endpoint,
                entry,
            });
        }
    }

    /// The failover walk for `key`.
    pub fn walk(&self, key: &[u8]) -> FailoverWalk<'_, C> {
        FailoverWalk {
            topology: self,
            token: self.token_of(key),
            cursor: Cursor::default(),
        }
    }
}

/// Lazily yields a key's candidates in failover order. Finite: at most one
/// candidate per rack.
pub struct FailoverWalk<'a, C> {
    topology: &'a Topology<C>,
    token: Token,
    cursor: Cursor,
}

impl<'a, C> FailoverWalk<'a, C> {
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}

impl<'a, C: Connection> Iterator for FailoverWalk<'a, C> {
    type Item = Candidate<'a, C>;

    fn next(&mut self) -> Option<Self::Item> {
        self.topology.select(&self.token, &mut self.cursor)
    }
}
