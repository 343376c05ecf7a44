//! Client configuration file.
//!
//! ```json
//! {
//!   "hash": "murmur",
//!   "connect_timeout_ms": 500,
//!   "reconnect_interval_ms": 10000,
//!   "datacenters": [
//!     { "name": "us-east", "kind": "local", "racks": [
//!       { "name": "rack1", "nodes": [
//!         { "host": "10.0.0.1", "port": 8102, "token": "1431655765" }
//!       ] }
//!     ] }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use corelib::topology::validate_datacenters;
use corelib::DatacenterConfig;
use serde::{Deserialize, Serialize};

use crate::connection::{ConnectOptions, DEFAULT_CONNECT_TIMEOUT};
use crate::error::{ClientError, Result};
use crate::reconnector::DEFAULT_RECONNECT_INTERVAL;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Hash function name; unknown names fall back to the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub connect_timeout_ms: u64,
    /// Read/write timeout on commands. Absent means block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_ms: Option<u64>,
    pub reconnect_interval_ms: u64,
    pub datacenters: Vec<DatacenterConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hash: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            command_timeout_ms: None,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL.as_millis() as u64,
            datacenters: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks everything that can be checked without connecting.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_ms == 0 {
            return Err(ClientError::Config(
                "connect_timeout_ms must be positive".to_owned(),
            ));
        }
        if self.reconnect_interval_ms == 0 {
            return Err(ClientError::Config(
                "reconnect_interval_ms must be positive".to_owned(),
            ));
        }
        if self.command_timeout_ms == Some(0) {
            return Err(ClientError::Config(
                "command_timeout_ms must be positive when set".to_owned(),
            ));
        }
        validate_datacenters(&self.datacenters)?;
        Ok(())
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            command_timeout: self.command_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::DatacenterKind;

    const SAMPLE: &str = r#"{
        "hash": "fnv1a_64",
        "command_timeout_ms": 250,
        "datacenters": [
            { "name": "us-east", "kind": "local", "racks": [
                { "name": "rack1", "nodes": [
                    { "host": "10.0.0.1", "port": 8102, "token": "1431655765" },
                    { "host": "10.0.0.2", "port": 8102, "token": "2863311530",
                      "credential": "s3cret" }
                ] }
            ] },
            { "name": "us-west", "kind": "remote" }
        ]
    }"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = ClientConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.hash.as_deref(), Some("fnv1a_64"));
        assert_eq!(config.connect_timeout_ms, 500);
        assert_eq!(config.reconnect_interval_ms, 10_000);
        assert_eq!(config.datacenters.len(), 2);
        assert_eq!(config.datacenters[1].kind, DatacenterKind::Remote);
        assert!(config.datacenters[1].racks.is_empty());
        assert_eq!(
            config.datacenters[0].racks[0].nodes[1].credential.as_deref(),
            Some("s3cret")
        );

        let options = config.connect_options();
        assert_eq!(options.connect_timeout, Duration::from_millis(500));
        assert_eq!(options.command_timeout, Some(Duration::from_millis(250)));
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(ClientConfig::from_json_str("{}").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = ClientConfig::from_json_str(SAMPLE).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ClientConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            ClientConfig::from_json_str("{ \"datacenters\": 3 }"),
            Err(ClientError::Config(_))
        ));
        let config = ClientConfig {
            reconnect_interval_ms: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_token() {
        let json = r#"{ "datacenters": [ { "name": "a", "kind": "local", "racks": [
            { "name": "r", "nodes": [ { "host": "h", "port": 1, "token": "-" } ] } ] } ] }"#;
        let config = ClientConfig::from_json_str(json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ClientError::Core(corelib::Error::InvalidToken(_)))
        ));
    }
}
