//! Client handle and builder
//!
//! A [`Client`] is cheap to clone and owns everything that outlives a single
//! operation: the node registry with its health, the channel pool, the
//! operator that pays for transactions, and the defaults operations fall
//! back to.

use crate::channel::{ChannelFactory, ChannelPool};
use crate::network::{BackoffConfig, Network, NodeRegistry, SelectionOrder};
use hedera_core::{AccountId, Hbar, HederaError, PublicKey, Result, Signer, TransactionId, TransactionIdGenerator};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default cap on attempts per operation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default overall time budget per operation
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Default per-attempt channel deadline
pub const DEFAULT_GRPC_DEADLINE: Duration = Duration::from_secs(10);
/// Default maximum paid for a single query
pub const DEFAULT_MAX_QUERY_PAYMENT: Hbar = Hbar::new(1);
/// Default maximum fee offered for a transaction
pub const DEFAULT_MAX_TRANSACTION_FEE: Hbar = Hbar::new(2);
/// Default spacing between the valid starts of consecutive chunks
pub const DEFAULT_CHUNK_INTERVAL_NANOS: u64 = 10;

/// Account that pays for transactions and query payments
#[derive(Clone)]
pub struct Operator {
    /// Paying account
    pub account_id: AccountId,
    /// Key authorizing payments from the account
    pub signer: Arc<dyn Signer>,
}

impl Operator {
    /// Public key of the operator's signer
    pub fn public_key(&self) -> PublicKey {
        self.signer.public_key()
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("account_id", &self.account_id)
            .field("public_key", &self.public_key())
            .finish()
    }
}

#[derive(Debug)]
struct ClientInner {
    registry: NodeRegistry,
    channels: ChannelPool,
    operator: Option<Operator>,
    ids: TransactionIdGenerator,
    max_attempts: u32,
    request_timeout: Duration,
    grpc_deadline: Duration,
    max_query_payment: Hbar,
    default_max_transaction_fee: Hbar,
    chunk_interval_nanos: u64,
}

/// Shared handle to a ledger network
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Start building a client for `network`
    pub fn builder(network: Network) -> ClientBuilder {
        ClientBuilder::new(network)
    }

    /// Node registry shared by every operation
    pub fn registry(&self) -> &NodeRegistry {
        &self.inner.registry
    }

    /// Channel pool shared by every operation
    pub fn channels(&self) -> &ChannelPool {
        &self.inner.channels
    }

    /// Paying operator, if configured
    pub fn operator(&self) -> Option<&Operator> {
        self.inner.operator.as_ref()
    }

    /// Paying operator, or an error naming what needed it
    pub fn require_operator(&self, purpose: &str) -> Result<&Operator> {
        self.operator()
            .ok_or_else(|| HederaError::invalid(format!("an operator is required to {purpose}")))
    }

    /// Fresh transaction identity paid by the operator
    pub fn generate_transaction_id(&self) -> Result<TransactionId> {
        self.generate_chunked_transaction_id(1)
    }

    /// Fresh base identity for a family of `chunks` transactions
    pub fn generate_chunked_transaction_id(&self, chunks: u32) -> Result<TransactionId> {
        let payer = self.require_operator("generate a transaction id")?.account_id;
        Ok(self
            .inner
            .ids
            .generate_chunked(payer, chunks, self.inner.chunk_interval_nanos))
    }

    /// Attempt cap used when an operation sets none
    pub fn max_attempts(&self) -> u32 {
        self.inner.max_attempts
    }

    /// Overall time budget used when an operation sets none
    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    /// Upper bound on a single channel round-trip
    pub fn grpc_deadline(&self) -> Duration {
        self.inner.grpc_deadline
    }

    /// Query payment cap used when a query sets none
    pub fn max_query_payment(&self) -> Hbar {
        self.inner.max_query_payment
    }

    /// Transaction fee cap used when a transaction sets none
    pub fn default_max_transaction_fee(&self) -> Hbar {
        self.inner.default_max_transaction_fee
    }

    /// Spacing between the valid starts of consecutive chunks
    pub fn chunk_interval_nanos(&self) -> u64 {
        self.inner.chunk_interval_nanos
    }
}

/// Builder for [`Client`]
pub struct ClientBuilder {
    network: Network,
    factory: Option<Arc<dyn ChannelFactory>>,
    operator: Option<Operator>,
    max_attempts: u32,
    request_timeout: Duration,
    grpc_deadline: Duration,
    backoff: BackoffConfig,
    selection_order: SelectionOrder,
    max_query_payment: Hbar,
    default_max_transaction_fee: Hbar,
    clock_skew: Duration,
    chunk_interval_nanos: u64,
}

impl ClientBuilder {
    /// Builder with default settings for `network`
    pub fn new(network: Network) -> Self {
        Self {
            network,
            factory: None,
            operator: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            grpc_deadline: DEFAULT_GRPC_DEADLINE,
            backoff: BackoffConfig::default(),
            selection_order: SelectionOrder::default(),
            max_query_payment: DEFAULT_MAX_QUERY_PAYMENT,
            default_max_transaction_fee: DEFAULT_MAX_TRANSACTION_FEE,
            clock_skew: Duration::ZERO,
            chunk_interval_nanos: DEFAULT_CHUNK_INTERVAL_NANOS,
        }
    }

    /// Transport used to reach nodes
    pub fn channel_factory(mut self, factory: Arc<dyn ChannelFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Account and key paying for operations
    pub fn operator(mut self, account_id: AccountId, signer: impl Signer + 'static) -> Self {
        self.operator = Some(Operator {
            account_id,
            signer: Arc::new(signer),
        });
        self
    }

    /// Default attempt cap
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Default overall time budget
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Per-attempt channel deadline
    pub fn grpc_deadline(mut self, deadline: Duration) -> Self {
        self.grpc_deadline = deadline;
        self
    }

    /// Node backoff bounds
    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Order in which healthy nodes are handed out
    pub fn selection_order(mut self, order: SelectionOrder) -> Self {
        self.selection_order = order;
        self
    }

    /// Default query payment cap
    pub fn max_query_payment(mut self, max: Hbar) -> Self {
        self.max_query_payment = max;
        self
    }

    /// Default transaction fee cap
    pub fn default_max_transaction_fee(mut self, fee: Hbar) -> Self {
        self.default_max_transaction_fee = fee;
        self
    }

    /// How far valid starts are backdated
    pub fn clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    /// Spacing between the valid starts of consecutive chunks
    pub fn chunk_interval_nanos(mut self, nanos: u64) -> Self {
        self.chunk_interval_nanos = nanos;
        self
    }

    /// Validate settings and build the client
    pub fn build(self) -> Result<Client> {
        let factory = self
            .factory
            .ok_or_else(|| HederaError::config("no channel factory configured"))?;
        if self.backoff.min_backoff > self.backoff.max_backoff {
            return Err(HederaError::config("min_backoff exceeds max_backoff"));
        }
        if self.request_timeout.is_zero() {
            return Err(HederaError::config("request_timeout must be positive"));
        }
        if self.chunk_interval_nanos == 0 {
            return Err(HederaError::config("chunk_interval_nanos must be positive"));
        }

        let registry = NodeRegistry::new(self.network.nodes(), self.backoff, self.selection_order)?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                registry,
                channels: ChannelPool::new(factory),
                operator: self.operator,
                ids: TransactionIdGenerator::new(self.clock_skew),
                max_attempts: self.max_attempts,
                request_timeout: self.request_timeout,
                grpc_deadline: self.grpc_deadline,
                max_query_payment: self.max_query_payment,
                default_max_transaction_fee: self.default_max_transaction_fee,
                chunk_interval_nanos: self.chunk_interval_nanos,
            }),
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("network", &self.network.name())
            .field("operator", &self.operator)
            .field("max_attempts", &self.max_attempts)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}
