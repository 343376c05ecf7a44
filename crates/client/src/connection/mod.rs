//! Backend connection abstractions.
//!
//! The client never speaks a wire protocol itself: it drives opaque
//! connections through [`Connection`] and opens them through a
//! [`Connector`]. Any [`ConnectionError`] is fatal to the connection it came
//! from; the pool entry holding it is invalidated and the handle closed.
//!
//! [`resp`] provides the default RESP2-over-TCP implementation.

pub mod resp;

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use corelib::Endpoint;

pub use resp::{RespConnection, RespConnector};

/// Default bound on establishing a TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Failures that make a connection unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The reply stream could not be parsed.
    #[error("malformed reply: {0}")]
    Malformed(String),
    /// The backend refused a handshake step (authentication, liveness probe).
    #[error("rejected by backend: {0}")]
    Rejected(String),
    #[error("{0} is unreachable")]
    Unreachable(String),
}

/// Timeouts applied when opening connections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    /// Read/write bound on command execution; `None` blocks indefinitely.
    pub command_timeout: Option<Duration>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: None,
        }
    }
}

/// A command as an argument vector, name first.
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    args: Vec<Bytes>,
}

impl Command {
    pub fn new(name: &str) -> Self {
        Self {
            args: vec![Bytes::copy_from_slice(name.as_bytes())],
        }
    }

    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.args[0]).into_owned()
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may be large or sensitive; the name is enough for logs.
        write!(f, "Command({}, {} args)", self.name(), self.args.len() - 1)
    }
}

/// A parsed backend reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Nil,
    Status(String),
    Integer(i64),
    Bulk(Bytes),
    Array(Vec<Reply>),
    /// Application-level error; the connection itself is healthy.
    Error(String),
}

/// An open connection to one backend.
///
/// Implementations are used by one thread at a time: the pool only hands a
/// connection out while its entry lock is held.
pub trait Connection: Send + 'static {
    /// Sends the credential configured for this endpoint.
    fn authenticate(&mut self, credential: &str) -> Result<(), ConnectionError>;

    /// Sends a command and waits for its reply.
    fn execute(&mut self, command: &Command) -> Result<Reply, ConnectionError>;

    /// Lightweight liveness probe.
    fn ping(&mut self) -> Result<(), ConnectionError> {
        match self.execute(&Command::new("PING"))? {
            Reply::Error(msg) => Err(ConnectionError::Rejected(msg)),
            _ => Ok(()),
        }
    }

    /// Releases the connection. Called exactly once, right before the
    /// connection is dropped by the pool.
    fn close(&mut self) {}
}

/// Opens connections to endpoints.
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    fn connect(
        &self,
        endpoint: &Endpoint,
        options: &ConnectOptions,
    ) -> Result<Self::Connection, ConnectionError>;
}

/// Connects and, when the endpoint carries a credential, authenticates.
/// A connection that fails to authenticate is closed before returning.
pub fn establish<K: Connector>(
    connector: &K,
    endpoint: &Endpoint,
    options: &ConnectOptions,
) -> Result<K::Connection, ConnectionError> {
    let mut conn = connector.connect(endpoint, options)?;
    if let Some(credential) = endpoint.credential.as_deref() {
        if let Err(err) = conn.authenticate(credential) {
            conn.close();
            return Err(err);
        }
    }
    Ok(conn)
}
