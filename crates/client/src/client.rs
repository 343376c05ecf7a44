//! Client construction and lifecycle.
//!
//! A [`ClientBuilder`] collects the cluster description. [`ClientBuilder::start`]
//! seals it, makes a first connection pass and starts the background
//! [`Reconnector`]. The resulting [`Client`] is shared by reference between
//! request threads; dropping it (or [`Client::shutdown`]) stops the
//! reconnector before any connection is closed.

use std::sync::Arc;
use std::time::Duration;

use corelib::{DatacenterKind, Endpoint, HashKind, HashResolution};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::connection::{Command, ConnectOptions, Connector, Reply};
use crate::error::Result;
use crate::pool::SlotState;
use crate::reconnector::{maintain, PassReport, Reconnector, DEFAULT_RECONNECT_INTERVAL};
use crate::selector::RouteStep;
use crate::topology::{Topology, TopologyBuilder};

/// State of one pool entry, as reported by [`Client::pool_status`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotStatus {
    pub kind: DatacenterKind,
    pub datacenter: String,
    pub rack: String,
    pub slot: usize,
    pub endpoint: Endpoint,
    pub state: SlotState,
}

pub struct ClientBuilder<K> {
    connector: K,
    hash: HashKind,
    resolution: HashResolution,
    options: ConnectOptions,
    reconnect_interval: Duration,
    topology: TopologyBuilder,
}

impl<K: Connector> ClientBuilder<K> {
    pub fn new(connector: K) -> Self {
        Self {
            connector,
            hash: HashKind::DEFAULT,
            resolution: HashResolution::Defaulted,
            options: ConnectOptions::default(),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            topology: TopologyBuilder::new(HashKind::DEFAULT),
        }
    }

    /// Builder preloaded from a configuration file's contents.
    pub fn from_config(config: &ClientConfig, connector: K) -> Result<Self> {
        config.validate()?;
        let mut builder = Self::new(connector).reconnect_interval(config.reconnect_interval());
        builder.options = config.connect_options();
        if let Some(hash) = config.hash.as_deref() {
            builder = builder.with_hash(hash);
        }
        for dc in &config.datacenters {
            builder.add_datacenter(dc.kind, dc.name.as_str(), dc.racks.len());
            for rack in &dc.racks {
                builder.add_rack(dc.kind, rack.name.as_str(), rack.nodes.len())?;
                for node in &rack.nodes {
                    builder.add_node(
                        dc.kind,
                        &rack.name,
                        &node.host,
                        node.port,
                        node.credential.as_deref(),
                        &node.token,
                    )?;
                }
            }
        }
        Ok(builder)
    }

    /// Selects the key hash by name. An unknown name keeps the default hash
    /// and is reported through [`Client::hash_resolution`].
    pub fn with_hash(mut self, name: &str) -> Self {
        let (kind, resolution) = HashKind::resolve_or_default(Some(name));
        if let HashResolution::Fallback { requested } = &resolution {
            warn!(requested = %requested, fallback = %kind, "unknown hash, using default");
        }
        self.hash = kind;
        self.resolution = resolution;
        self.topology.set_hash(kind);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.command_timeout = timeout;
        self
    }

    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Declares a datacenter. Returns `false`, changing nothing, if one of
    /// this kind already exists.
    pub fn add_datacenter(
        &mut self,
        kind: DatacenterKind,
        name: impl Into<String>,
        rack_count: usize,
    ) -> bool {
        self.topology.add_datacenter(kind, name, rack_count)
    }

    pub fn add_rack(
        &mut self,
        kind: DatacenterKind,
        name: impl Into<String>,
        node_count: usize,
    ) -> Result<()> {
        Ok(self.topology.add_rack(kind, name, node_count)?)
    }

    pub fn add_node(
        &mut self,
        kind: DatacenterKind,
        rack: &str,
        host: &str,
        port: u16,
        credential: Option<&str>,
        token: &str,
    ) -> Result<()> {
        let endpoint = Endpoint::new(host, port).with_credential(credential.map(str::to_owned));
        self.topology.add_node(kind, rack, endpoint, token)?;
        Ok(())
    }

    /// Seals the topology, connects what can be connected and starts the
    /// reconnector. Nodes that are down now stay invalid until a later pass
    /// reaches them.
    pub fn start(self) -> Result<Client<K>> {
        self.start_with(Reconnector::spawn::<K>)
    }

    fn start_with<S>(self, spawn: S) -> Result<Client<K>>
    where
        S: FnOnce(
            Arc<Topology<K::Connection>>,
            Arc<K>,
            ConnectOptions,
            Duration,
        ) -> std::io::Result<Reconnector>,
    {
        let topology = Arc::new(self.topology.build()?);
        let connector = Arc::new(self.connector);

        let report = maintain(&*topology, &*connector, &self.options);
        info!(
            hash = %self.hash,
            connected = report.reconnected,
            unreachable = report.failed,
            "client started"
        );

        let reconnector = match spawn(
            topology.clone(),
            connector.clone(),
            self.options,
            self.reconnect_interval,
        ) {
            Ok(reconnector) => reconnector,
            Err(err) => {
                let closed = topology.close_all();
                warn!(closed, error = %err, "reconnector failed to start");
                return Err(err.into());
            }
        };

        Ok(Client {
            topology,
            connector,
            options: self.options,
            resolution: self.resolution,
            reconnector: Some(reconnector),
            closed: false,
        })
    }
}

/// A started client. Safe to share between threads.
pub struct Client<K: Connector> {
    topology: Arc<Topology<K::Connection>>,
    connector: Arc<K>,
    options: ConnectOptions,
    resolution: HashResolution,
    reconnector: Option<Reconnector>,
    closed: bool,
}

impl<K: Connector> Client<K> {
    pub fn hash_kind(&self) -> HashKind {
        self.topology.hash_kind()
    }

    /// How the hash was chosen, including any fallback.
    pub fn hash_resolution(&self) -> &HashResolution {
        &self.resolution
    }

    pub fn topology(&self) -> &Topology<K::Connection> {
        &self.topology
    }

    /// Sends a raw command along `key`'s failover walk.
    pub fn execute(&self, key: impl AsRef<[u8]>, command: &Command) -> Result<Reply> {
        self.topology.dispatch(key.as_ref(), command)
    }

    /// Runs one maintenance pass on the calling thread.
    pub fn maintenance_pass(&self) -> PassReport {
        maintain(&*self.topology, &*self.connector, &self.options)
    }

    /// Snapshot of every pool entry. Entries locked at the time read as
    /// [`SlotState::Busy`].
    pub fn pool_status(&self) -> Vec<SlotStatus> {
        let mut status = Vec::new();
        for dc in self.topology.datacenters() {
            for rack in dc.racks() {
                for entry in rack.continuum().entries() {
                    let Some(pool_entry) = rack.entry(entry.slot) else {
                        continue;
                    };
                    status.push(SlotStatus {
                        kind: dc.kind(),
                        datacenter: dc.name().to_owned(),
                        rack: rack.name().to_owned(),
                        slot: entry.slot,
                        endpoint: entry.endpoint.clone(),
                        state: pool_entry.state(),
                    });
                }
            }
        }
        status
    }

    /// Full failover order of `key`, without touching any connection.
    pub fn route(&self, key: impl AsRef<[u8]>) -> Vec<RouteStep> {
        self.topology
            .walk(key.as_ref())
            .map(|candidate| RouteStep::from(&candidate))
            .collect()
    }

    /// Stops the reconnector, then closes every connection.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(mut reconnector) = self.reconnector.take() {
            reconnector.stop();
        }
        let closed = self.topology.close_all();
        info!(closed, "client shut down");
    }
}

impl<K: Connector> Drop for Client<K> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Connection, ConnectionError};
    use crate::error::ClientError;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counts {
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    struct CountedConn(Arc<Counts>);

    impl Connection for CountedConn {
        fn authenticate(&mut self, _credential: &str) -> std::result::Result<(), ConnectionError> {
            Ok(())
        }

        fn execute(&mut self, _command: &Command) -> std::result::Result<Reply, ConnectionError> {
            Ok(Reply::Status("OK".to_owned()))
        }

        fn close(&mut self) {
            self.0.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountedConnector(Arc<Counts>);

    impl Connector for CountedConnector {
        type Connection = CountedConn;

        fn connect(
            &self,
            _endpoint: &Endpoint,
            _options: &ConnectOptions,
        ) -> std::result::Result<CountedConn, ConnectionError> {
            self.0.opened.fetch_add(1, Ordering::SeqCst);
            Ok(CountedConn(self.0.clone()))
        }
    }

    #[test]
    fn test_failed_spawn_closes_initial_connections() {
        let counts = Arc::new(Counts::default());
        let mut builder = ClientBuilder::new(CountedConnector(counts.clone()));
        builder.add_datacenter(DatacenterKind::Local, "dc1", 1);
        builder.add_rack(DatacenterKind::Local, "rack1", 2).unwrap();
        builder
            .add_node(DatacenterKind::Local, "rack1", "h", 1, None, "100")
            .unwrap();
        builder
            .add_node(DatacenterKind::Local, "rack1", "h", 2, None, "200")
            .unwrap();

        let result = builder.start_with(|_, _, _, _| {
            Err(io::Error::new(io::ErrorKind::Other, "no threads left"))
        });

        assert!(matches!(result, Err(ClientError::Io(_))));
        assert_eq!(counts.opened.load(Ordering::SeqCst), 2);
        assert_eq!(counts.closed.load(Ordering::SeqCst), 2);
    }
}
