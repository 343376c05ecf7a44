//! Runtime topology: datacenters of racks, each rack a sealed continuum with
//! one pool entry per continuum slot.
//!
//! The shape is fixed once built. Only pool entries change afterwards, each
//! under its own lock.

use corelib::{
    Continuum, ContinuumBuilder, DatacenterKind, Endpoint, Error, HashKind, HashPartitioner,
    Partitioner, Token,
};
use tracing::debug;

use crate::connection::Connection;
use crate::pool::PoolEntry;

/// One failure domain: its ring and the connections serving it.
pub struct Rack<C> {
    continuum: Continuum,
    pool: Vec<PoolEntry<C>>,
}

impl<C: Connection> Rack<C> {
    fn new(continuum: Continuum) -> Self {
        let pool = (0..continuum.len()).map(|_| PoolEntry::new()).collect();
        Self { continuum, pool }
    }

    pub fn name(&self) -> &str {
        self.continuum.rack()
    }

    pub fn continuum(&self) -> &Continuum {
        &self.continuum
    }

    /// Pool entries, index-aligned with the continuum slots.
    pub fn pool(&self) -> &[PoolEntry<C>] {
        &self.pool
    }

    pub fn entry(&self, slot: usize) -> Option<&PoolEntry<C>> {
        self.pool.get(slot)
    }

    pub fn endpoint(&self, slot: usize) -> Option<&Endpoint> {
        self.continuum.get(slot).map(|entry| &entry.endpoint)
    }

    /// Slot serving `token`, or `None` for a rack without nodes.
    pub fn locate(&self, token: &Token) -> Option<usize> {
        self.continuum.locate(token)
    }
}

pub struct Datacenter<C> {
    name: String,
    kind: DatacenterKind,
    racks: Vec<Rack<C>>,
}

impl<C: Connection> Datacenter<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DatacenterKind {
        self.kind
    }

    /// Racks in registration order.
    pub fn racks(&self) -> &[Rack<C>] {
        &self.racks
    }
}

/// All datacenters of one client plus the key partitioner.
pub struct Topology<C> {
    partitioner: HashPartitioner,
    local: Option<Datacenter<C>>,
    remote: Option<Datacenter<C>>,
}

impl<C: Connection> Topology<C> {
    pub fn hash_kind(&self) -> HashKind {
        self.partitioner.kind()
    }

    /// Ring token of `key`.
    pub fn token_of(&self, key: &[u8]) -> Token {
        self.partitioner.partition(key)
    }

    pub fn datacenter(&self, kind: DatacenterKind) -> Option<&Datacenter<C>> {
        match kind {
            DatacenterKind::Local => self.local.as_ref(),
            DatacenterKind::Remote => self.remote.as_ref(),
        }
    }

    /// Configured datacenters in failover order.
    pub fn datacenters(&self) -> impl Iterator<Item = &Datacenter<C>> {
        DatacenterKind::ORDER
            .into_iter()
            .filter_map(move |kind| self.datacenter(kind))
    }

    pub fn is_unconfigured(&self) -> bool {
        self.local.is_none() && self.remote.is_none()
    }

    /// Invalidates every entry, closing its handle. Returns how many handles
    /// were closed.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        for dc in self.datacenters() {
            for rack in dc.racks() {
                for entry in rack.pool() {
                    if entry.lock().invalidate() {
                        closed += 1;
                    }
                }
            }
        }
        closed
    }
}

struct DatacenterBuilder {
    name: String,
    kind: DatacenterKind,
    rack_count: usize,
    racks: Vec<ContinuumBuilder>,
}

/// Collects the cluster description before it is sealed into a [`Topology`].
pub struct TopologyBuilder {
    partitioner: HashPartitioner,
    local: Option<DatacenterBuilder>,
    remote: Option<DatacenterBuilder>,
}

impl TopologyBuilder {
    pub fn new(hash: HashKind) -> Self {
        Self {
            partitioner: HashPartitioner::new(hash),
            local: None,
            remote: None,
        }
    }

    /// Replaces the key hash. Ring tokens are unaffected.
    pub fn set_hash(&mut self, hash: HashKind) {
        self.partitioner = HashPartitioner::new(hash);
    }

    fn slot(&mut self, kind: DatacenterKind) -> &mut Option<DatacenterBuilder> {
        match kind {
            DatacenterKind::Local => &mut self.local,
            DatacenterKind::Remote => &mut self.remote,
        }
    }

    /// Declares the datacenter of `kind` with room for `rack_count` racks.
    ///
    /// A second declaration of the same kind changes nothing and returns
    /// `false`.
    pub fn add_datacenter(
        &mut self,
        kind: DatacenterKind,
        name: impl Into<String>,
        rack_count: usize,
    ) -> bool {
        let slot = self.slot(kind);
        if slot.is_some() {
            return false;
        }
        *slot = Some(DatacenterBuilder {
            name: name.into(),
            kind,
            rack_count,
            racks: Vec::with_capacity(rack_count),
        });
        true
    }

    /// Names the next free rack of the datacenter and fixes its node capacity.
    pub fn add_rack(
        &mut self,
        kind: DatacenterKind,
        name: impl Into<String>,
        node_count: usize,
    ) -> corelib::Result<()> {
        let name = name.into();
        let dc = self
            .slot(kind)
            .as_mut()
            .ok_or(Error::DatacenterUnconfigured(kind))?;
        if dc.racks.iter().any(|rack| rack.rack() == name) {
            return Err(Error::DuplicateRack {
                datacenter: dc.name.clone(),
                rack: name,
            });
        }
        if dc.racks.len() >= dc.rack_count {
            return Err(Error::DatacenterFull {
                datacenter: dc.name.clone(),
                capacity: dc.rack_count,
            });
        }
        dc.racks.push(ContinuumBuilder::new(name, node_count));
        Ok(())
    }

    /// Registers a node on a named rack at the ring position `token`
    /// (base 10).
    pub fn add_node(
        &mut self,
        kind: DatacenterKind,
        rack: &str,
        endpoint: Endpoint,
        token: &str,
    ) -> corelib::Result<usize> {
        let dc = self
            .slot(kind)
            .as_mut()
            .ok_or(Error::DatacenterUnconfigured(kind))?;
        let builder = dc
            .racks
            .iter_mut()
            .find(|r| r.rack() == rack)
            .ok_or_else(|| Error::UnknownRack {
                kind,
                rack: rack.to_owned(),
            })?;
        let token = Token::parse(token)?;
        builder.add(token, endpoint)
    }

    /// Sorts every rack's ring and allocates its pool, all entries invalid.
    pub fn build<C: Connection>(self) -> corelib::Result<Topology<C>> {
        Ok(Topology {
            partitioner: self.partitioner,
            local: self.local.map(build_datacenter).transpose()?,
            remote: self.remote.map(build_datacenter).transpose()?,
        })
    }
}

fn build_datacenter<C: Connection>(dc: DatacenterBuilder) -> corelib::Result<Datacenter<C>> {
    let racks = dc
        .racks
        .into_iter()
        .map(|rack| rack.build().map(Rack::new))
        .collect::<corelib::Result<Vec<_>>>()?;
    if racks.len() < dc.rack_count {
        debug!(
            datacenter = %dc.name,
            declared = dc.rack_count,
            named = racks.len(),
            "datacenter has unnamed racks"
        );
    }
    Ok(Datacenter {
        name: dc.name,
        kind: dc.kind,
        racks,
    })
}
