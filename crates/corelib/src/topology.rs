//! Static ring topology.
//!
//! Operators describe the cluster as datacenters of racks of nodes. This
//! module holds that description as plain serde types plus the checks that
//! can run before any connection is opened.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::Endpoint;
use crate::token::Token;

/// Preference tier of a datacenter. `Local` is tried first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatacenterKind {
    Local,
    Remote,
}

impl DatacenterKind {
    /// Failover order.
    pub const ORDER: [DatacenterKind; 2] = [DatacenterKind::Local, DatacenterKind::Remote];
}

impl fmt::Display for DatacenterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatacenterKind::Local => f.write_str("local"),
            DatacenterKind::Remote => f.write_str("remote"),
        }
    }
}

/// One storage node and its ring coordinate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    /// Base-10 ring token.
    pub token: String,
}

impl NodeConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port).with_credential(self.credential.clone())
    }

    pub fn parse_token(&self) -> Result<Token> {
        Ok(Token::parse(&self.token)?)
    }
}

/// A failure domain with its own ring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackConfig {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterConfig {
    pub name: String,
    pub kind: DatacenterKind,
    #[serde(default)]
    pub racks: Vec<RackConfig>,
}

/// Checks a datacenter list without building anything: at most one
/// datacenter per kind, unique rack names, parseable and rack-unique tokens.
pub fn validate_datacenters(datacenters: &[DatacenterConfig]) -> Result<()> {
    let mut kinds = HashSet::new();
    for dc in datacenters {
        if !kinds.insert(dc.kind) {
            return Err(Error::InvalidConfig(format!(
                "more than one {} datacenter",
                dc.kind
            )));
        }
        let mut racks = HashSet::new();
        for rack in &dc.racks {
            if !racks.insert(rack.name.as_str()) {
                return Err(Error::DuplicateRack {
                    datacenter: dc.name.clone(),
                    rack: rack.name.clone(),
                });
            }
            let mut tokens = HashSet::new();
            for node in &rack.nodes {
                let token = node.parse_token()?;
                if !tokens.insert(token) {
                    return Err(Error::DuplicateToken {
                        rack: rack.name.clone(),
                        token,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(port: u16, token: &str) -> NodeConfig {
        NodeConfig {
            host: "127.0.0.1".to_owned(),
            port,
            credential: None,
            token: token.to_owned(),
        }
    }

    fn dc(kind: DatacenterKind, racks: Vec<RackConfig>) -> DatacenterConfig {
        DatacenterConfig {
            name: format!("{kind}-dc"),
            kind,
            racks,
        }
    }

    #[test]
    fn test_kind_serde_names() {
        let kind: DatacenterKind = serde_json::from_str("\"remote\"").unwrap();
        assert_eq!(kind, DatacenterKind::Remote);
        assert_eq!(serde_json::to_string(&DatacenterKind::Local).unwrap(), "\"local\"");
    }

    #[test]
    fn test_valid_topology() {
        let racks = vec![RackConfig {
            name: "rack1".to_owned(),
            nodes: vec![node(1, "1431655765"), node(2, "2863311530"), node(3, "4294967295")],
        }];
        assert_eq!(validate_datacenters(&[dc(DatacenterKind::Local, racks)]), Ok(()));
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let err = validate_datacenters(&[
            dc(DatacenterKind::Local, vec![]),
            dc(DatacenterKind::Local, vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let racks = vec![RackConfig {
            name: "rack1".to_owned(),
            nodes: vec![node(1, "100"), node(2, "0100")],
        }];
        let err = validate_datacenters(&[dc(DatacenterKind::Local, racks)]).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateToken {
                rack: "rack1".to_owned(),
                token: Token::from_u32(100),
            }
        );
    }

    #[test]
    fn test_same_token_in_different_racks_is_fine() {
        let racks = vec![
            RackConfig {
                name: "rack1".to_owned(),
                nodes: vec![node(1, "100")],
            },
            RackConfig {
                name: "rack2".to_owned(),
                nodes: vec![node(2, "100")],
            },
        ];
        assert!(validate_datacenters(&[dc(DatacenterKind::Remote, racks)]).is_ok());
    }

    #[test]
    fn test_bad_token_rejected() {
        let racks = vec![RackConfig {
            name: "rack1".to_owned(),
            nodes: vec![node(1, "12ab")],
        }];
        let err = validate_datacenters(&[dc(DatacenterKind::Local, racks)]).unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
    }
}
