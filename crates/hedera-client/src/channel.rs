//! Channel capability and the shared channel pool
//!
//! A channel is a long-lived request/response transport to one node
//! address. The client never opens more than one channel per address and
//! shares it between every in-flight operation. A channel whose call fails
//! at the transport level is dropped from the pool, so the next attempt
//! reconnects and falls through to the node's other addresses if needed.

use crate::network::NodeEndpoint;
use async_trait::async_trait;
use hedera_core::{HederaError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Authenticated transport to a single node address
#[async_trait]
pub trait Channel: Send + Sync {
    /// Send encoded request bytes and wait for the encoded response
    async fn call(&self, request: Vec<u8>) -> Result<Vec<u8>>;
}

/// Opens channels to node addresses
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    /// Connect to `address`, authenticating the peer against `cert_hash` when given
    async fn connect(&self, address: &str, cert_hash: Option<&str>) -> Result<Arc<dyn Channel>>;
}

/// One channel per address, created on first use
pub struct ChannelPool {
    factory: Arc<dyn ChannelFactory>,
    channels: Mutex<HashMap<String, Arc<dyn Channel>>>,
}

impl ChannelPool {
    /// Empty pool backed by `factory`
    pub fn new(factory: Arc<dyn ChannelFactory>) -> Self {
        Self {
            factory,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Channel to `node`, trying its addresses in order
    pub async fn channel_for(&self, node: &NodeEndpoint) -> Result<Arc<dyn Channel>> {
        let mut last_error = None;

        for address in node.addresses() {
            let cached = self.channels.lock().get(address).cloned();
            if let Some(channel) = cached {
                return Ok(channel);
            }

            match self.factory.connect(address, node.cert_hash()).await {
                Ok(channel) => {
                    let channel = Arc::clone(
                        self.channels
                            .lock()
                            .entry(address.clone())
                            .or_insert(channel),
                    );
                    return Ok(channel);
                }
                Err(err) => {
                    debug!(node = %node.account_id(), address, error = %err, "Connect failed");
                    last_error = Some(err);
                }
            }
        }

        let message = last_error.map_or_else(|| "no addresses".to_string(), |err| err.to_string());
        Err(HederaError::transport(node.account_id(), message))
    }

    /// Drop `channel` from the pool after it failed at the transport level
    ///
    /// Other operations still holding the channel keep their clone.
    pub fn evict(&self, node: &NodeEndpoint, channel: &Arc<dyn Channel>) {
        let mut channels = self.channels.lock();
        let before = channels.len();
        channels.retain(|_, cached| !Arc::ptr_eq(cached, channel));
        if channels.len() < before {
            debug!(node = %node.account_id(), "Evicted failed channel");
        }
    }

    /// Number of open channels
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    /// Whether no channel has been opened yet
    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }
}

impl fmt::Debug for ChannelPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelPool")
            .field("channels", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{BackoffConfig, NodeAddress, NodeRegistry, SelectionOrder};
    use hedera_core::AccountId;
    use std::collections::HashSet;

    struct Echo;

    #[async_trait]
    impl Channel for Echo {
        async fn call(&self, request: Vec<u8>) -> Result<Vec<u8>> {
            Ok(request)
        }
    }

    /// Refuses listed addresses, counts successful connects per address
    #[derive(Default)]
    struct Factory {
        refused: Mutex<HashSet<String>>,
        connects: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChannelFactory for Factory {
        async fn connect(&self, address: &str, _cert_hash: Option<&str>) -> Result<Arc<dyn Channel>> {
            if self.refused.lock().contains(address) {
                return Err(HederaError::transport(AccountId::new(0, 0, 3), "refused"));
            }
            self.connects.lock().push(address.to_string());
            Ok(Arc::new(Echo))
        }
    }

    fn registry() -> NodeRegistry {
        let node = NodeAddress::new(AccountId::new(0, 0, 3), ["primary:1", "backup:1"]);
        NodeRegistry::new(vec![node], BackoffConfig::default(), SelectionOrder::Random).unwrap()
    }

    #[tokio::test]
    async fn test_channel_is_reused() {
        let factory = Arc::new(Factory::default());
        let pool = ChannelPool::new(factory.clone());
        let registry = registry();
        let node = &registry.nodes()[0];

        let first = pool.channel_for(node).await.unwrap();
        let second = pool.channel_for(node).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*factory.connects.lock(), vec!["primary:1".to_string()]);
    }

    #[tokio::test]
    async fn test_evicted_channel_falls_through_to_next_address() {
        let factory = Arc::new(Factory::default());
        let pool = ChannelPool::new(factory.clone());
        let registry = registry();
        let node = &registry.nodes()[0];

        let dead = pool.channel_for(node).await.unwrap();
        factory.refused.lock().insert("primary:1".to_string());
        pool.evict(node, &dead);
        assert!(pool.is_empty());

        let replacement = pool.channel_for(node).await.unwrap();
        assert!(!Arc::ptr_eq(&dead, &replacement));
        assert_eq!(
            *factory.connects.lock(),
            vec!["primary:1".to_string(), "backup:1".to_string()]
        );
        assert_eq!(pool.len(), 1);
    }
}
