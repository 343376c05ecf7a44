//! Backend endpoints.
//!
//! An endpoint is where a ring entry's connection goes. Keep it small and
//! cheap to clone; connection state lives in the client's pool.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address and optional credential of one storage node.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Password sent with `AUTH` after every (re)connect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<Option<String>>) -> Self {
        self.credential = credential.into();
        self
    }

    pub fn requires_auth(&self) -> bool {
        self.credential.is_some()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// Credentials never reach logs.
impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
