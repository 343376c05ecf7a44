//! In-memory backends for integration tests.
//!
//! A [`MockCluster`] holds one backend per port. Each backend can be taken
//! down and brought back, can require a password, and counts the commands
//! it served. Connections are numbered so tests can check that every opened
//! connection is closed exactly once.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use client::{
    ClientBuilder, Command, ConnectOptions, Connection, ConnectionError, Connector,
    DatacenterKind, Endpoint, Reply,
};
use parking_lot::Mutex;

pub fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .with_test_writer()
        .try_init();
}

/// Evenly spaced thirds of the 32-bit ring.
pub const THIRDS: [&str; 3] = ["1431655765", "2863311530", "4294967295"];

#[derive(Default)]
struct Backend {
    up: bool,
    password: Option<String>,
    strings: HashMap<Vec<u8>, Bytes>,
    hashes: HashMap<Vec<u8>, HashMap<Vec<u8>, Bytes>>,
    commands: usize,
    pings: usize,
    // Incremented by a restart; connections from earlier epochs are dead.
    epoch: usize,
}

#[derive(Default)]
struct Inner {
    backends: Mutex<HashMap<u16, Backend>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    double_closes: AtomicUsize,
    next_id: AtomicUsize,
    last_options: Mutex<Option<ConnectOptions>>,
}

#[derive(Clone, Default)]
pub struct MockCluster {
    inner: Arc<Inner>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reachable backend on `port`.
    pub fn add_backend(&self, port: u16) {
        self.inner.backends.lock().insert(
            port,
            Backend {
                up: true,
                ..Backend::default()
            },
        );
    }

    pub fn set_password(&self, port: u16, password: &str) {
        if let Some(backend) = self.inner.backends.lock().get_mut(&port) {
            backend.password = Some(password.to_owned());
        }
    }

    pub fn set_up(&self, port: u16, up: bool) {
        if let Some(backend) = self.inner.backends.lock().get_mut(&port) {
            backend.up = up;
        }
    }

    /// Restarts the backend on `port`: it stays reachable, but every
    /// connection opened before now fails.
    pub fn restart(&self, port: u16) {
        if let Some(backend) = self.inner.backends.lock().get_mut(&port) {
            backend.epoch += 1;
        }
    }

    fn epoch(&self, port: u16) -> usize {
        self.inner
            .backends
            .lock()
            .get(&port)
            .map_or(0, |backend| backend.epoch)
    }

    pub fn is_up(&self, port: u16) -> bool {
        self.inner
            .backends
            .lock()
            .get(&port)
            .map_or(false, |backend| backend.up)
    }

    /// Data commands served, not counting `PING` and `AUTH`.
    pub fn commands(&self, port: u16) -> usize {
        self.inner
            .backends
            .lock()
            .get(&port)
            .map_or(0, |backend| backend.commands)
    }

    pub fn pings(&self, port: u16) -> usize {
        self.inner
            .backends
            .lock()
            .get(&port)
            .map_or(0, |backend| backend.pings)
    }

    pub fn stored(&self, port: u16, key: &str) -> Option<Bytes> {
        self.inner
            .backends
            .lock()
            .get(&port)
            .and_then(|backend| backend.strings.get(key.as_bytes()).cloned())
    }

    pub fn opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn double_closes(&self) -> usize {
        self.inner.double_closes.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent connect attempt.
    pub fn last_options(&self) -> Option<ConnectOptions> {
        *self.inner.last_options.lock()
    }

    pub fn connector(&self) -> MockConnector {
        MockConnector {
            cluster: self.clone(),
        }
    }
}

pub struct MockConnector {
    cluster: MockCluster,
}

impl Connector for MockConnector {
    type Connection = MockConnection;

    fn connect(
        &self,
        endpoint: &Endpoint,
        options: &ConnectOptions,
    ) -> Result<MockConnection, ConnectionError> {
        let inner = &self.cluster.inner;
        *inner.last_options.lock() = Some(*options);
        if !self.cluster.is_up(endpoint.port) {
            return Err(ConnectionError::Unreachable(endpoint.to_string()));
        }
        inner.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            id: inner.next_id.fetch_add(1, Ordering::SeqCst),
            port: endpoint.port,
            epoch: self.cluster.epoch(endpoint.port),
            authenticated: false,
            closed: false,
            inner: inner.clone(),
        })
    }
}

pub struct MockConnection {
    id: usize,
    port: u16,
    epoch: usize,
    authenticated: bool,
    closed: bool,
    inner: Arc<Inner>,
}

impl MockConnection {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Connection for MockConnection {
    fn authenticate(&mut self, credential: &str) -> Result<(), ConnectionError> {
        match self.execute(&Command::new("AUTH").arg(credential))? {
            Reply::Error(msg) => Err(ConnectionError::Rejected(msg)),
            _ => {
                self.authenticated = true;
                Ok(())
            }
        }
    }

    fn execute(&mut self, command: &Command) -> Result<Reply, ConnectionError> {
        assert!(!self.closed, "command on closed connection {}", self.id);
        let mut backends = self.inner.backends.lock();
        let epoch = self.epoch;
        let backend = backends
            .get_mut(&self.port)
            .filter(|backend| backend.up && backend.epoch == epoch)
            .ok_or_else(|| {
                ConnectionError::Io(std::io::Error::from(
                    std::io::ErrorKind::ConnectionReset,
                ))
            })?;
        Ok(serve(backend, &mut self.authenticated, command))
    }

    fn close(&mut self) {
        if self.closed {
            self.inner.double_closes.fetch_add(1, Ordering::SeqCst);
            return;
        }
        self.closed = true;
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn serve(backend: &mut Backend, authenticated: &mut bool, command: &Command) -> Reply {
    let args = command.args();
    let name = command.name().to_ascii_uppercase();
    let arg = |i: usize| args.get(i).map(|b| b.to_vec()).unwrap_or_default();

    match name.as_str() {
        "PING" => {
            backend.pings += 1;
            return Reply::Status("PONG".to_owned());
        }
        "AUTH" => {
            return match backend.password.as_deref() {
                Some(password) if password.as_bytes() == arg(1).as_slice() => {
                    *authenticated = true;
                    Reply::Status("OK".to_owned())
                }
                Some(_) => Reply::Error("WRONGPASS invalid password".to_owned()),
                None => Reply::Error("ERR no password is set".to_owned()),
            };
        }
        _ => {}
    }

    if backend.password.is_some() && !*authenticated {
        return Reply::Error("NOAUTH Authentication required".to_owned());
    }
    backend.commands += 1;

    match name.as_str() {
        "SET" => {
            backend.strings.insert(arg(1), Bytes::from(arg(2)));
            Reply::Status("OK".to_owned())
        }
        "SETEX" | "PSETEX" => {
            let ttl = std::str::from_utf8(&arg(2))
                .ok()
                .and_then(|s| s.parse::<i64>().ok());
            if !matches!(ttl, Some(ttl) if ttl > 0) {
                return Reply::Error(format!(
                    "ERR invalid expire time in '{}' command",
                    name.to_ascii_lowercase()
                ));
            }
            backend.strings.insert(arg(1), Bytes::from(arg(3)));
            Reply::Status("OK".to_owned())
        }
        "GET" => backend
            .strings
            .get(&arg(1))
            .cloned()
            .map_or(Reply::Nil, Reply::Bulk),
        "DEL" => {
            let removed = backend.strings.remove(&arg(1)).is_some()
                | backend.hashes.remove(&arg(1)).is_some();
            Reply::Integer(i64::from(removed))
        }
        "EXISTS" => Reply::Integer(i64::from(
            backend.strings.contains_key(&arg(1)) || backend.hashes.contains_key(&arg(1)),
        )),
        "EXPIRE" => Reply::Integer(i64::from(backend.strings.contains_key(&arg(1)))),
        "INCR" | "INCRBY" | "DECR" | "DECRBY" => {
            let delta = match name.as_str() {
                "INCR" => Some(1),
                "DECR" => Some(-1),
                _ => std::str::from_utf8(&arg(2))
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .map(|n| if name == "DECRBY" { -n } else { n }),
            };
            let current = match backend.strings.get(&arg(1)) {
                None => Some(0),
                Some(value) => std::str::from_utf8(value)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok()),
            };
            match (current, delta) {
                (Some(current), Some(delta)) => {
                    let next = current + delta;
                    backend
                        .strings
                        .insert(arg(1), Bytes::from(next.to_string()));
                    Reply::Integer(next)
                }
                _ => Reply::Error("ERR value is not an integer or out of range".to_owned()),
            }
        }
        "HSET" => {
            let fields = backend.hashes.entry(arg(1)).or_default();
            let created = fields.insert(arg(2), Bytes::from(arg(3))).is_none();
            Reply::Integer(i64::from(created))
        }
        "HGET" => backend
            .hashes
            .get(&arg(1))
            .and_then(|fields| fields.get(&arg(2)).cloned())
            .map_or(Reply::Nil, Reply::Bulk),
        other => Reply::Error(format!("ERR unknown command '{other}'")),
    }
}

/// Declares `racks` racks in the datacenter of `kind`, three nodes each at
/// [`THIRDS`], on consecutive ports from `first_port`. Every backend is added
/// to `cluster` as reachable. Returns the ports of each rack.
pub fn add_racks(
    builder: &mut ClientBuilder<MockConnector>,
    cluster: &MockCluster,
    kind: DatacenterKind,
    racks: usize,
    first_port: u16,
) -> Vec<Vec<u16>> {
    builder.add_datacenter(kind, format!("{kind}-dc"), racks);
    let mut port = first_port;
    let mut layout = Vec::new();
    for r in 0..racks {
        let rack = format!("{kind}-rack{r}");
        builder.add_rack(kind, rack.as_str(), THIRDS.len()).unwrap();
        let mut ports = Vec::new();
        for token in THIRDS {
            cluster.add_backend(port);
            builder
                .add_node(kind, &rack, "127.0.0.1", port, None, token)
                .unwrap();
            ports.push(port);
            port += 1;
        }
        layout.push(ports);
    }
    layout
}
