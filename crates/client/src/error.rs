//! Error types for the client.

use crate::connection::{ConnectionError, Reply};

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced to callers of the client.
///
/// Connection-level failures on the request path are absorbed by failover
/// and only show up as [`ClientError::RoutingExhausted`] once every rack has
/// been tried.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Building the topology failed.
    #[error(transparent)]
    Core(#[from] corelib::Error),

    /// Neither a local nor a remote datacenter exists.
    #[error("no datacenter is configured")]
    DatacenterUnconfigured,

    /// Every rack in both datacenters was invalid or failed.
    #[error("routing exhausted: no rack could serve the request")]
    RoutingExhausted,

    #[error("connection failed: {0}")]
    ConnectionFailed(#[from] ConnectionError),

    /// The backend answered with an error reply. The connection is kept.
    #[error("backend error: {0}")]
    Protocol(String),

    /// The backend answered, but not with what the command returns.
    #[error("unexpected reply to {command}: {reply:?}")]
    UnexpectedReply { command: String, reply: Reply },

    /// An expiry too short for the command carrying it.
    #[error("invalid ttl {0:?}")]
    InvalidTtl(std::time::Duration),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// True for failures a later retry may get past.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::RoutingExhausted | ClientError::ConnectionFailed(_)
        )
    }
}
