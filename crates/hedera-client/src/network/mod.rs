//! Network description and node registry
//!
//! A network is a set of nodes, each reachable at one or more addresses and
//! identified by its node account. [`Network`] describes where the nodes
//! are; [`NodeRegistry`] tracks how healthy they currently look and decides
//! which node the next attempt goes to.

mod registry;

pub use registry::{
    BackoffConfig, NodeEndpoint, NodeHealth, NodeRegistry, NodeSelection, Selected, SelectionOrder,
};

use hedera_core::{AccountId, HederaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where one node can be reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    /// Node account the node signs for
    pub account_id: AccountId,
    /// Transport addresses, tried in order
    pub addresses: Vec<String>,
    /// Hex fingerprint of the node's TLS certificate
    #[serde(default)]
    pub cert_hash: Option<String>,
}

impl NodeAddress {
    /// Node reachable at `addresses` without certificate pinning
    pub fn new(account_id: AccountId, addresses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            account_id,
            addresses: addresses.into_iter().map(Into::into).collect(),
            cert_hash: None,
        }
    }
}

/// Which ledger network to talk to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    /// Production network
    Mainnet,
    /// Public test network
    Testnet,
    /// Preview network for upcoming releases
    Previewnet,
    /// Explicit node map
    Custom(Vec<NodeAddress>),
}

const MAINNET_NODES: &[(u64, &str)] = &[
    (3, "35.237.200.180:50211"),
    (4, "35.186.191.247:50211"),
    (5, "35.192.2.25:50211"),
    (6, "35.199.161.108:50211"),
    (7, "35.203.82.240:50211"),
    (8, "35.236.5.219:50211"),
    (9, "35.197.192.225:50211"),
    (10, "35.242.233.154:50211"),
    (11, "35.240.118.96:50211"),
    (12, "35.204.86.32:50211"),
];

fn hosted_nodes(domain: &str) -> Vec<NodeAddress> {
    (0..7u64)
        .map(|i| NodeAddress::new(AccountId::new(0, 0, i + 3), [format!("{i}.{domain}:50211")]))
        .collect()
}

impl Network {
    /// Nodes making up this network
    pub fn nodes(&self) -> Vec<NodeAddress> {
        match self {
            Network::Mainnet => MAINNET_NODES
                .iter()
                .map(|(num, address)| NodeAddress::new(AccountId::new(0, 0, *num), [*address]))
                .collect(),
            Network::Testnet => hosted_nodes("testnet.hedera.com"),
            Network::Previewnet => hosted_nodes("previewnet.hedera.com"),
            Network::Custom(nodes) => nodes.clone(),
        }
    }

    /// Short name of a well-known network
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Previewnet => "previewnet",
            Network::Custom(_) => "custom",
        }
    }
}

impl FromStr for Network {
    type Err = HederaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "previewnet" => Ok(Network::Previewnet),
            other => Err(HederaError::config(format!("unknown network {other:?}"))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_networks() {
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert!("devnet".parse::<Network>().is_err());

        let testnet = Network::Testnet.nodes();
        assert_eq!(testnet.len(), 7);
        assert_eq!(testnet[0].account_id, AccountId::new(0, 0, 3));
        assert_eq!(testnet[0].addresses, vec!["0.testnet.hedera.com:50211".to_string()]);

        assert_eq!(Network::Mainnet.nodes().len(), 10);
    }
}
