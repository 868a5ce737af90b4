//! Node registry with per-node health tracking
//!
//! Every node carries its own health record behind its own lock, so
//! operations against different nodes never contend. Nodes are never
//! removed: a node that keeps failing is pushed further into the future by
//! exponential backoff and comes back once the backoff expires.

use super::NodeAddress;
use crate::execute::Outcome;
use hedera_core::{AccountId, HederaError, Result};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Backoff bounds applied to unhealthy nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Base delay doubled per consecutive failure
    pub min_backoff: Duration,
    /// Upper bound before jitter
    pub max_backoff: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl BackoffConfig {
    /// `min(max_backoff, min_backoff * 2^exponent)` without jitter
    pub fn delay(&self, exponent: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(exponent.min(20));
        self.min_backoff.saturating_mul(multiplier).min(self.max_backoff)
    }

    /// [`delay`](Self::delay) plus up to 10% random jitter
    pub fn delay_with_jitter(&self, exponent: u32) -> Duration {
        let delay = self.delay(exponent);
        let spread = delay.as_millis() as u64 / 10;
        if spread == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }
}

/// Order in which healthy nodes are handed out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrder {
    /// Uniformly random among healthy nodes
    #[default]
    Random,
    /// Cycle through healthy nodes
    RoundRobin,
}

/// Which nodes an operation may be sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelection {
    /// Any node in the registry
    Any,
    /// Only these nodes; never falls back to others
    Pinned(Vec<AccountId>),
    /// This node while it is healthy, otherwise any node
    Preferred(AccountId),
}

/// Snapshot of a node's health record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeHealth {
    /// When the node last failed
    pub last_error_at: Option<Instant>,
    /// Failures since the last healthy response
    pub consecutive_failures: u32,
    /// Node is avoided until this instant
    pub backoff_until: Option<Instant>,
    /// Failures reported over the registry's lifetime
    pub total_failures: u64,
    /// Healthy responses reported over the registry's lifetime
    pub total_successes: u64,
}

/// A known node and its mutable health
#[derive(Debug)]
pub struct NodeEndpoint {
    account_id: AccountId,
    addresses: Vec<String>,
    cert_hash: Option<String>,
    health: Mutex<NodeHealth>,
}

impl NodeEndpoint {
    fn new(address: NodeAddress) -> Self {
        Self {
            account_id: address.account_id,
            addresses: address.addresses,
            cert_hash: address.cert_hash,
            health: Mutex::new(NodeHealth::default()),
        }
    }

    /// Node account id
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Transport addresses, in preference order
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Certificate fingerprint used to authenticate the channel
    pub fn cert_hash(&self) -> Option<&str> {
        self.cert_hash.as_deref()
    }

    /// Current health record
    pub fn health(&self) -> NodeHealth {
        self.health.lock().clone()
    }

    /// Whether the node is outside any backoff window at `now`
    pub fn is_healthy(&self, now: Instant) -> bool {
        self.health
            .lock()
            .backoff_until
            .map_or(true, |until| until <= now)
    }

    fn backoff_until(&self) -> Option<Instant> {
        self.health.lock().backoff_until
    }
}

/// Node chosen for the next attempt
#[derive(Debug, Clone)]
pub struct Selected {
    /// The node
    pub node: Arc<NodeEndpoint>,
    /// How long until the node leaves backoff; zero when healthy
    pub wait: Duration,
}

/// Shared set of nodes and their health
#[derive(Debug)]
pub struct NodeRegistry {
    nodes: Vec<Arc<NodeEndpoint>>,
    by_id: HashMap<AccountId, Arc<NodeEndpoint>>,
    backoff: BackoffConfig,
    order: SelectionOrder,
    cursor: AtomicUsize,
}

impl NodeRegistry {
    /// Build a registry from a node map
    pub fn new(
        addresses: Vec<NodeAddress>,
        backoff: BackoffConfig,
        order: SelectionOrder,
    ) -> Result<Self> {
        if addresses.is_empty() {
            return Err(HederaError::config("network has no nodes"));
        }

        let mut nodes = Vec::with_capacity(addresses.len());
        let mut by_id = HashMap::with_capacity(addresses.len());
        for address in addresses {
            if address.addresses.is_empty() {
                return Err(HederaError::config(format!(
                    "node {} has no addresses",
                    address.account_id
                )));
            }
            let node = Arc::new(NodeEndpoint::new(address));
            if by_id.insert(node.account_id, Arc::clone(&node)).is_some() {
                return Err(HederaError::config(format!(
                    "node {} listed twice",
                    node.account_id
                )));
            }
            nodes.push(node);
        }

        Ok(Self {
            nodes,
            by_id,
            backoff,
            order,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Look up a node by account id
    pub fn get(&self, account_id: &AccountId) -> Option<&Arc<NodeEndpoint>> {
        self.by_id.get(account_id)
    }

    /// All nodes, in configuration order
    pub fn nodes(&self) -> &[Arc<NodeEndpoint>] {
        &self.nodes
    }

    /// Backoff bounds in use
    pub fn backoff(&self) -> BackoffConfig {
        self.backoff
    }

    /// Number of nodes `selection` may draw from
    pub fn candidate_count(&self, selection: &NodeSelection) -> usize {
        match selection {
            NodeSelection::Pinned(ids) => ids.len(),
            NodeSelection::Any | NodeSelection::Preferred(_) => self.nodes.len(),
        }
    }

    /// Pick the node for the next attempt
    ///
    /// Healthy candidates outside `exclude` win. When every candidate is
    /// backed off, the one whose backoff expires soonest is returned together
    /// with the time left on it; selection itself never blocks. `exclude` is
    /// ignored when it would leave nothing to choose from.
    pub fn select(&self, selection: &NodeSelection, exclude: &HashSet<AccountId>) -> Result<Selected> {
        let now = Instant::now();

        let candidates: Vec<Arc<NodeEndpoint>> = match selection {
            NodeSelection::Any => self.nodes.clone(),
            NodeSelection::Pinned(ids) => ids
                .iter()
                .map(|id| {
                    self.by_id
                        .get(id)
                        .cloned()
                        .ok_or(HederaError::UnknownNode { node: *id })
                })
                .collect::<Result<_>>()?,
            NodeSelection::Preferred(id) => {
                let preferred = self
                    .by_id
                    .get(id)
                    .ok_or(HederaError::UnknownNode { node: *id })?;
                if preferred.is_healthy(now) && !exclude.contains(id) {
                    return Ok(Selected {
                        node: Arc::clone(preferred),
                        wait: Duration::ZERO,
                    });
                }
                self.nodes.clone()
            }
        };

        if candidates.is_empty() {
            return Err(HederaError::invalid("no nodes to select from"));
        }

        let mut eligible: Vec<_> = candidates
            .iter()
            .filter(|node| !exclude.contains(&node.account_id))
            .cloned()
            .collect();
        if eligible.is_empty() {
            eligible = candidates;
        }

        let healthy: Vec<_> = eligible
            .iter()
            .filter(|node| node.is_healthy(now))
            .cloned()
            .collect();

        if !healthy.is_empty() {
            let node = match self.order {
                SelectionOrder::Random => healthy
                    .choose(&mut rand::thread_rng())
                    .cloned()
                    .unwrap_or_else(|| Arc::clone(&healthy[0])),
                SelectionOrder::RoundRobin => {
                    let index = self.cursor.fetch_add(1, Ordering::Relaxed) % healthy.len();
                    Arc::clone(&healthy[index])
                }
            };
            return Ok(Selected {
                node,
                wait: Duration::ZERO,
            });
        }

        let (node, until) = eligible
            .iter()
            .filter_map(|node| node.backoff_until().map(|until| (node, until)))
            .min_by_key(|(_, until)| *until)
            .map(|(node, until)| (Arc::clone(node), until))
            .unwrap_or_else(|| (Arc::clone(&eligible[0]), now));

        Ok(Selected {
            node,
            wait: until.saturating_duration_since(now),
        })
    }

    /// Record the outcome of an attempt against `node`
    ///
    /// A retryable failure grows the node's backoff; any well-formed answer
    /// clears it. Returns the backoff now in force for the node.
    pub fn report(&self, node: &NodeEndpoint, outcome: &Outcome) -> Duration {
        let now = Instant::now();
        let mut health = node.health.lock();

        match outcome {
            Outcome::RetryableFailure => {
                health.consecutive_failures = health.consecutive_failures.saturating_add(1);
                health.total_failures += 1;
                health.last_error_at = Some(now);
                let backoff = self.backoff.delay_with_jitter(health.consecutive_failures);
                health.backoff_until = Some(now + backoff);

                debug!(
                    node = %node.account_id,
                    consecutive_failures = health.consecutive_failures,
                    backoff_ms = backoff.as_millis() as u64,
                    "Node backed off"
                );
                backoff
            }
            Outcome::Accepted | Outcome::FatalFailure => {
                if health.consecutive_failures > 0 {
                    debug!(node = %node.account_id, "Node healthy again");
                }
                health.consecutive_failures = 0;
                health.backoff_until = None;
                health.total_successes += 1;
                Duration::ZERO
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(n: u64, order: SelectionOrder) -> NodeRegistry {
        let nodes = (0..n)
            .map(|i| NodeAddress::new(AccountId::new(0, 0, i + 3), [format!("node-{i}:50211")]))
            .collect();
        NodeRegistry::new(nodes, BackoffConfig::default(), order).unwrap()
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let backoff = BackoffConfig {
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(1_000),
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_millis(1_000));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_millis(1_000));

        let jittered = backoff.delay_with_jitter(1);
        assert!(jittered >= Duration::from_millis(200) && jittered <= Duration::from_millis(220));
    }

    #[test]
    fn test_rejects_bad_network() {
        assert!(NodeRegistry::new(vec![], BackoffConfig::default(), SelectionOrder::Random).is_err());

        let dup = vec![
            NodeAddress::new(AccountId::new(0, 0, 3), ["a:1"]),
            NodeAddress::new(AccountId::new(0, 0, 3), ["b:1"]),
        ];
        assert!(NodeRegistry::new(dup, BackoffConfig::default(), SelectionOrder::Random).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_backs_off_and_success_clears() {
        let registry = registry(1, SelectionOrder::Random);
        let node = Arc::clone(&registry.nodes()[0]);

        let first = registry.report(&node, &Outcome::RetryableFailure);
        let second = registry.report(&node, &Outcome::RetryableFailure);
        assert!(first >= Duration::from_millis(500));
        assert!(second >= Duration::from_millis(1_000));
        assert!(!node.is_healthy(Instant::now()));
        assert_eq!(node.health().consecutive_failures, 2);

        registry.report(&node, &Outcome::Accepted);
        let health = node.health();
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.backoff_until, None);
        assert_eq!(health.total_failures, 2);
        assert_eq!(health.total_successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_skips_backed_off_and_excluded() {
        let registry = registry(3, SelectionOrder::RoundRobin);
        let nodes = registry.nodes().to_vec();
        registry.report(&nodes[0], &Outcome::RetryableFailure);

        let exclude: HashSet<_> = [nodes[1].account_id()].into_iter().collect();
        for _ in 0..5 {
            let selected = registry.select(&NodeSelection::Any, &exclude).unwrap();
            assert_eq!(selected.node.account_id(), nodes[2].account_id());
            assert_eq!(selected.wait, Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_backed_off_returns_soonest_expiry() {
        let registry = registry(2, SelectionOrder::Random);
        let nodes = registry.nodes().to_vec();
        registry.report(&nodes[0], &Outcome::RetryableFailure);
        registry.report(&nodes[0], &Outcome::RetryableFailure);
        registry.report(&nodes[1], &Outcome::RetryableFailure);

        let selected = registry.select(&NodeSelection::Any, &HashSet::new()).unwrap();
        assert_eq!(selected.node.account_id(), nodes[1].account_id());
        assert!(selected.wait > Duration::ZERO);
        assert!(selected.wait <= Duration::from_millis(550));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pinned_never_falls_back() {
        let registry = registry(3, SelectionOrder::Random);
        let pinned = registry.nodes()[1].account_id();
        registry.report(&registry.nodes()[1], &Outcome::RetryableFailure);

        let selection = NodeSelection::Pinned(vec![pinned]);
        let exclude: HashSet<_> = [pinned].into_iter().collect();
        let selected = registry.select(&selection, &exclude).unwrap();
        assert_eq!(selected.node.account_id(), pinned);
        assert!(selected.wait > Duration::ZERO);

        let unknown = NodeSelection::Pinned(vec![AccountId::new(0, 0, 99)]);
        assert!(matches!(
            registry.select(&unknown, &HashSet::new()),
            Err(HederaError::UnknownNode { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_preferred_falls_back_when_unhealthy() {
        let registry = registry(2, SelectionOrder::Random);
        let preferred = registry.nodes()[0].account_id();
        let selection = NodeSelection::Preferred(preferred);

        let selected = registry.select(&selection, &HashSet::new()).unwrap();
        assert_eq!(selected.node.account_id(), preferred);

        registry.report(&registry.nodes()[0], &Outcome::RetryableFailure);
        let selected = registry.select(&selection, &HashSet::new()).unwrap();
        assert_eq!(selected.node.account_id(), registry.nodes()[1].account_id());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reports_keep_exact_counts() {
        const TASKS: u64 = 8;
        const REPORTS: u64 = 500;

        let registry = Arc::new(registry(2, SelectionOrder::Random));
        let tasks: Vec<_> = (0..TASKS)
            .map(|task| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    let node = Arc::clone(&registry.nodes()[0]);
                    let outcome = if task % 2 == 0 {
                        Outcome::RetryableFailure
                    } else {
                        Outcome::Accepted
                    };
                    for _ in 0..REPORTS {
                        registry.report(&node, &outcome);
                        let _ = registry.select(&NodeSelection::Any, &HashSet::new());
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let health = registry.nodes()[0].health();
        assert_eq!(health.total_failures, TASKS / 2 * REPORTS);
        assert_eq!(health.total_successes, TASKS / 2 * REPORTS);
        assert_eq!(registry.nodes()[1].health(), NodeHealth::default());
    }
}
