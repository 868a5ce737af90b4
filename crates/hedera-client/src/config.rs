//! Client configuration
//!
//! TOML form of everything [`ClientBuilder`] accepts except the transport,
//! which is always supplied in code:
//!
//! ```toml
//! network = "testnet"
//! max_attempts = 5
//! selection = "round_robin"
//!
//! [operator]
//! account_id = "0.0.1001"
//! private_key = "<hex seed>"
//! ```
//!
//! An explicit node map replaces the named network:
//!
//! ```toml
//! [network]
//! "0.0.3" = ["127.0.0.1:50211"]
//! "0.0.4" = { addresses = ["127.0.0.2:50211"], cert_hash = "<hex fingerprint>" }
//! ```

use crate::client::{
    ClientBuilder, DEFAULT_CHUNK_INTERVAL_NANOS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_QUERY_PAYMENT,
    DEFAULT_MAX_TRANSACTION_FEE,
};
use crate::network::{BackoffConfig, Network, NodeAddress, SelectionOrder};
use hedera_core::{AccountId, Hbar, HederaError, PrivateKey, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Named network or explicit node map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworkConfig {
    /// `mainnet`, `testnet` or `previewnet`
    Named(String),
    /// Node account id to its addresses
    Nodes(BTreeMap<String, NodeConfig>),
}

/// One entry of an explicit node map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeConfig {
    /// Addresses only, no certificate pinning
    Addresses(Vec<String>),
    /// Addresses with an optional pinned certificate
    Detailed {
        /// Transport addresses, tried in order
        addresses: Vec<String>,
        /// Hex fingerprint of the node's TLS certificate
        #[serde(default)]
        cert_hash: Option<String>,
    },
}

impl NodeConfig {
    fn to_address(&self, account_id: AccountId) -> NodeAddress {
        match self {
            NodeConfig::Addresses(addresses) => NodeAddress::new(account_id, addresses.iter().cloned()),
            NodeConfig::Detailed {
                addresses,
                cert_hash,
            } => NodeAddress {
                cert_hash: cert_hash.clone(),
                ..NodeAddress::new(account_id, addresses.iter().cloned())
            },
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig::Named("testnet".to_string())
    }
}

impl NetworkConfig {
    /// Resolve into a [`Network`]
    pub fn to_network(&self) -> Result<Network> {
        match self {
            NetworkConfig::Named(name) => name.parse(),
            NetworkConfig::Nodes(nodes) => nodes
                .iter()
                .map(|(id, node)| Ok(node.to_address(id.parse()?)))
                .collect::<Result<Vec<_>>>()
                .map(Network::Custom),
        }
    }
}

/// Paying account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Account id as `shard.realm.num`
    pub account_id: String,
    /// Hex-encoded ed25519 seed
    pub private_key: String,
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Network to talk to
    pub network: NetworkConfig,
    /// Paying account
    pub operator: Option<OperatorConfig>,
    /// Attempt cap per operation
    pub max_attempts: u32,
    /// Overall time budget per operation
    pub request_timeout_ms: u64,
    /// Per-attempt channel deadline
    pub grpc_deadline_ms: u64,
    /// Base node backoff
    pub min_backoff_ms: u64,
    /// Node backoff cap
    pub max_backoff_ms: u64,
    /// Query payment cap
    pub max_query_payment_tinybars: i64,
    /// Transaction fee cap
    pub default_max_transaction_fee_tinybars: i64,
    /// Node selection order
    pub selection: SelectionOrder,
    /// How far valid starts are backdated
    pub clock_skew_ms: u64,
    /// Spacing between chunk valid starts
    pub chunk_interval_nanos: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let backoff = BackoffConfig::default();
        Self {
            network: NetworkConfig::default(),
            operator: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout_ms: 120_000,
            grpc_deadline_ms: 10_000,
            min_backoff_ms: backoff.min_backoff.as_millis() as u64,
            max_backoff_ms: backoff.max_backoff.as_millis() as u64,
            max_query_payment_tinybars: DEFAULT_MAX_QUERY_PAYMENT.to_tinybars(),
            default_max_transaction_fee_tinybars: DEFAULT_MAX_TRANSACTION_FEE.to_tinybars(),
            selection: SelectionOrder::default(),
            clock_skew_ms: 0,
            chunk_interval_nanos: DEFAULT_CHUNK_INTERVAL_NANOS,
        }
    }
}

impl ClientConfig {
    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| HederaError::config(format!("invalid client config: {e}")))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| HederaError::config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Builder carrying these settings; the channel factory is still required
    pub fn into_builder(self) -> Result<ClientBuilder> {
        let mut builder = ClientBuilder::new(self.network.to_network()?)
            .max_attempts(self.max_attempts)
            .request_timeout(Duration::from_millis(self.request_timeout_ms))
            .grpc_deadline(Duration::from_millis(self.grpc_deadline_ms))
            .backoff(BackoffConfig {
                min_backoff: Duration::from_millis(self.min_backoff_ms),
                max_backoff: Duration::from_millis(self.max_backoff_ms),
            })
            .selection_order(self.selection)
            .max_query_payment(Hbar::from_tinybars(self.max_query_payment_tinybars))
            .default_max_transaction_fee(Hbar::from_tinybars(
                self.default_max_transaction_fee_tinybars,
            ))
            .clock_skew(Duration::from_millis(self.clock_skew_ms))
            .chunk_interval_nanos(self.chunk_interval_nanos);

        if let Some(operator) = self.operator {
            let account_id: AccountId = operator.account_id.parse()?;
            let key: PrivateKey = operator.private_key.parse()?;
            builder = builder.operator(account_id, key);
        }

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.request_timeout_ms, 120_000);
        assert_eq!(config.selection, SelectionOrder::Random);
        assert_eq!(config.network.to_network().unwrap(), Network::Testnet);
    }

    #[test]
    fn test_explicit_node_map() {
        let config = ClientConfig::from_toml_str(
            r#"
            max_attempts = 3
            selection = "round_robin"

            [network]
            "0.0.3" = ["127.0.0.1:50211", "127.0.0.2:50211"]
            "0.0.4" = ["127.0.0.3:50211"]

            [operator]
            account_id = "0.0.1001"
            private_key = "0101010101010101010101010101010101010101010101010101010101010101"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.selection, SelectionOrder::RoundRobin);
        let nodes = config.network.to_network().unwrap().nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].account_id, AccountId::new(0, 0, 3));
        assert_eq!(nodes[0].addresses.len(), 2);
        assert!(config.into_builder().is_ok());
    }

    #[test]
    fn test_node_map_with_pinned_certificate() {
        let config = ClientConfig::from_toml_str(
            r#"
            [network]
            "0.0.3" = ["127.0.0.1:50211"]
            "0.0.4" = { addresses = ["127.0.0.2:50211"], cert_hash = "abcd" }
            "0.0.5" = { addresses = ["127.0.0.3:50211"] }
            "#,
        )
        .unwrap();

        let nodes = config.network.to_network().unwrap().nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].cert_hash, None);
        assert_eq!(nodes[1].account_id, AccountId::new(0, 0, 4));
        assert_eq!(nodes[1].addresses, vec!["127.0.0.2:50211".to_string()]);
        assert_eq!(nodes[1].cert_hash.as_deref(), Some("abcd"));
        assert_eq!(nodes[2].cert_hash, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ClientConfig::from_toml_str("max_attempts = \"many\"").is_err());

        let config = ClientConfig::from_toml_str("network = \"devnet\"").unwrap();
        assert!(config.into_builder().is_err());
    }
}
