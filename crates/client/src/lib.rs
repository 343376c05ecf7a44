//! Routing client for a replicated key-value cluster.
//!
//! Keys are hashed onto per-rack rings. A request goes to its key's node in
//! the first rack with a working connection, trying every rack of the local
//! datacenter before those of the remote one. Broken connections are dropped
//! on the request path and rebuilt by a background thread.
//!
//! ```no_run
//! use client::{ClientBuilder, DatacenterKind, RespConnector};
//!
//! # fn main() -> client::Result<()> {
//! let mut builder = ClientBuilder::new(RespConnector).with_hash("murmur");
//! builder.add_datacenter(DatacenterKind::Local, "dc1", 1);
//! builder.add_rack(DatacenterKind::Local, "rack1", 1)?;
//! builder.add_node(DatacenterKind::Local, "rack1", "127.0.0.1", 8102, None, "4294967295")?;
//! let client = builder.start()?;
//! client.set("greeting", "hello")?;
//! assert_eq!(client.get("greeting")?.as_deref(), Some(&b"hello"[..]));
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod pool;
pub mod reconnector;
pub mod selector;
pub mod topology;

pub use client::{Client, ClientBuilder, SlotStatus};
pub use config::ClientConfig;
pub use connection::{
    Command, ConnectOptions, Connection, ConnectionError, Connector, Reply, RespConnection,
    RespConnector,
};
pub use corelib::{DatacenterKind, Endpoint, HashKind, HashResolution, Token};
pub use error::{ClientError, Result};
pub use pool::SlotState;
pub use reconnector::{PassReport, Reconnector};
pub use selector::{Cursor, RouteStep};
pub use topology::Topology;
