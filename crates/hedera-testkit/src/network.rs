//! Scripted mock network
//!
//! Replies are taken from the addressed node's own script first, then from
//! a script shared by all nodes, then from the default answer for the
//! request kind:
//!
//! | request             | default answer                       |
//! |---------------------|--------------------------------------|
//! | transaction         | precheck `OK`                        |
//! | cost query          | precheck `OK`, cost 0                |
//! | receipt query       | receipt with status `SUCCESS`        |
//! | record query        | record with a `SUCCESS` receipt      |
//! | balance query       | 100 hbar                             |
//! | file info query     | empty, undeleted file                |

use async_trait::async_trait;
use hedera_client::channel::{Channel, ChannelFactory};
use hedera_client::network::{BackoffConfig, Network, NodeAddress};
use hedera_client::ClientBuilder;
use hedera_core::proto::{
    self, QueryAnswer, QueryData, Request, Response, ResponseHeader, ResponseType,
    SignedTransaction, TransactionBody,
};
use hedera_core::{
    AccountId, FileInfo, Hbar, HederaError, PrivateKey, Result, Status, Timestamp,
    TransactionId, TransactionReceipt, TransactionRecord,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

const SCHEME: &str = "mock://";

/// One scripted answer
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with this precheck status and no answer body
    Precheck(Status),
    /// Answer a query with precheck `OK` and this cost in tinybars
    Cost(u64),
    /// Answer with a receipt carrying this status
    Receipt(Status),
    /// Answer with exactly this response
    Response(Response),
    /// Fail the call at the transport level
    Transport(String),
    /// Wait, then answer with the inner reply
    Delayed(Duration, Box<MockReply>),
}

/// A request as a node received it
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Node the request was sent to
    pub node: AccountId,
    /// Decoded request
    pub request: Request,
}

impl CapturedRequest {
    /// Decoded body of a submitted transaction
    pub fn transaction_body(&self) -> Option<TransactionBody> {
        match &self.request {
            Request::Transaction(signed) => signed.body().ok(),
            Request::Query(_) => None,
        }
    }

    /// Signed transaction, for submissions
    pub fn signed_transaction(&self) -> Option<&SignedTransaction> {
        match &self.request {
            Request::Transaction(signed) => Some(signed),
            Request::Query(_) => None,
        }
    }

    /// Query, for lookups
    pub fn query(&self) -> Option<&proto::Query> {
        match &self.request {
            Request::Query(query) => Some(query),
            Request::Transaction(_) => None,
        }
    }

    /// Whether this is a cost-only query
    pub fn is_cost_query(&self) -> bool {
        self.query()
            .is_some_and(|query| query.header.response_type == ResponseType::CostAnswer)
    }

    /// Decoded body of the payment attached to a query
    pub fn payment_body(&self) -> Option<TransactionBody> {
        self.query()?.header.payment.as_ref()?.body().ok()
    }
}

#[derive(Debug, Default)]
struct NodeState {
    replies: VecDeque<MockReply>,
}

#[derive(Debug)]
struct Inner {
    node_ids: Vec<AccountId>,
    nodes: Mutex<HashMap<AccountId, NodeState>>,
    shared: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<CapturedRequest>>,
    unreachable: Mutex<HashSet<AccountId>>,
    connects: AtomicUsize,
}

/// In-memory network of scripted nodes
#[derive(Debug, Clone)]
pub struct MockNetwork {
    inner: Arc<Inner>,
}

impl MockNetwork {
    /// Network of `nodes` nodes numbered from `0.0.3`
    pub fn new(nodes: u64) -> Self {
        let node_ids: Vec<_> = (0..nodes).map(|i| AccountId::new(0, 0, i + 3)).collect();
        Self {
            inner: Arc::new(Inner {
                nodes: Mutex::new(node_ids.iter().map(|id| (*id, NodeState::default())).collect()),
                node_ids,
                shared: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                unreachable: Mutex::new(HashSet::new()),
                connects: AtomicUsize::new(0),
            }),
        }
    }

    /// Node ids, in order
    pub fn node_ids(&self) -> Vec<AccountId> {
        self.inner.node_ids.clone()
    }

    /// Address map for the client
    pub fn addresses(&self) -> Vec<NodeAddress> {
        self.inner
            .node_ids
            .iter()
            .map(|id| NodeAddress::new(*id, [format!("{SCHEME}{id}")]))
            .collect()
    }

    /// Key the operator of [`client_builder`](Self::client_builder) signs with
    pub fn operator_key(&self) -> Result<PrivateKey> {
        crate::test_key(42)
    }

    /// Builder wired to this network with an operator and short backoffs
    pub fn client_builder(&self) -> Result<ClientBuilder> {
        Ok(ClientBuilder::new(Network::Custom(self.addresses()))
            .channel_factory(Arc::new(self.clone()))
            .operator(crate::OPERATOR_ACCOUNT, self.operator_key()?)
            .backoff(BackoffConfig {
                min_backoff: Duration::from_millis(10),
                max_backoff: Duration::from_millis(200),
            }))
    }

    /// Queue a reply for whichever node answers next
    pub fn push_reply(&self, reply: MockReply) {
        self.inner.shared.lock().push_back(reply);
    }

    /// Queue several replies for whichever nodes answer next
    pub fn push_replies(&self, replies: impl IntoIterator<Item = MockReply>) {
        self.inner.shared.lock().extend(replies);
    }

    /// Queue a reply for `node` only
    pub fn push_node_reply(&self, node: AccountId, reply: MockReply) {
        if let Some(state) = self.inner.nodes.lock().get_mut(&node) {
            state.replies.push_back(reply);
        }
    }

    /// Make connecting to `node` fail
    pub fn set_unreachable(&self, node: AccountId, unreachable: bool) {
        let mut set = self.inner.unreachable.lock();
        if unreachable {
            set.insert(node);
        } else {
            set.remove(&node);
        }
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.inner.requests.lock().clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.inner.requests.lock().len()
    }

    /// Number of channels opened
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::Relaxed)
    }

    fn next_reply(&self, node: AccountId) -> Option<MockReply> {
        let own = self
            .inner
            .nodes
            .lock()
            .get_mut(&node)
            .and_then(|state| state.replies.pop_front());
        own.or_else(|| self.inner.shared.lock().pop_front())
    }

    async fn handle(&self, node: AccountId, bytes: &[u8]) -> Result<Vec<u8>> {
        let request: Request = proto::decode(bytes)?;
        self.inner.requests.lock().push(CapturedRequest {
            node,
            request: request.clone(),
        });

        if self.inner.unreachable.lock().contains(&node) {
            return Err(HederaError::transport(node, "connection reset"));
        }

        let mut reply = self.next_reply(node);
        trace!(%node, ?reply, "Mock node answering");
        let response = loop {
            match reply {
                Some(MockReply::Delayed(delay, inner)) => {
                    tokio::time::sleep(delay).await;
                    reply = Some(*inner);
                }
                None => break default_answer(&request),
                Some(MockReply::Transport(message)) => {
                    return Err(HederaError::transport(node, message))
                }
                Some(MockReply::Response(response)) => break response,
                Some(MockReply::Precheck(status)) => break precheck_only(&request, status, 0),
                Some(MockReply::Cost(cost)) => break precheck_only(&request, Status::Ok, cost),
                Some(MockReply::Receipt(status)) => break receipt_answer(&request, status),
            }
        };
        proto::encode(&response)
    }
}

fn precheck_only(request: &Request, status: Status, cost: u64) -> Response {
    match request {
        Request::Transaction(_) => Response::Transaction { precheck: status },
        Request::Query(_) => Response::Query {
            header: ResponseHeader {
                precheck: status,
                cost,
            },
            answer: None,
        },
    }
}

fn queried_transaction(request: &Request) -> Option<TransactionId> {
    match request {
        Request::Query(proto::Query {
            data:
                QueryData::TransactionGetReceipt { transaction_id }
                | QueryData::TransactionGetRecord { transaction_id },
            ..
        }) => Some(*transaction_id),
        _ => None,
    }
}

fn receipt_answer(request: &Request, status: Status) -> Response {
    let mut receipt = TransactionReceipt::with_status(status);
    receipt.transaction_id = queried_transaction(request);
    answered(QueryAnswer::Receipt(receipt))
}

fn answered(answer: QueryAnswer) -> Response {
    Response::Query {
        header: ResponseHeader {
            precheck: Status::Ok,
            cost: 0,
        },
        answer: Some(answer),
    }
}

fn default_answer(request: &Request) -> Response {
    let query = match request {
        Request::Transaction(_) => return Response::Transaction { precheck: Status::Ok },
        Request::Query(query) => query,
    };
    if query.header.response_type == ResponseType::CostAnswer {
        return precheck_only(request, Status::Ok, 0);
    }

    match &query.data {
        QueryData::TransactionGetReceipt { .. } => receipt_answer(request, Status::Success),
        QueryData::TransactionGetRecord { transaction_id } => {
            let mut receipt = TransactionReceipt::with_status(Status::Success);
            receipt.transaction_id = Some(*transaction_id);
            answered(QueryAnswer::Record(TransactionRecord {
                receipt,
                transaction_hash: Vec::new(),
                consensus_timestamp: transaction_id.valid_start,
                transaction_id: *transaction_id,
                memo: String::new(),
                transaction_fee: Hbar::ZERO,
                transfers: Vec::new(),
                nft_transfers: Vec::new(),
            }))
        }
        QueryData::CryptoGetAccountBalance { account_id } => answered(QueryAnswer::AccountBalance {
            account_id: *account_id,
            balance: Hbar::new(100),
        }),
        QueryData::FileGetInfo { file_id } => answered(QueryAnswer::FileInfo(FileInfo {
            file_id: *file_id,
            size: 0,
            expiration_time: Timestamp::new(0, 0),
            is_deleted: false,
            keys: None,
        })),
    }
}

/// Channel to one mock node
struct MockChannel {
    network: MockNetwork,
    node: AccountId,
}

#[async_trait]
impl Channel for MockChannel {
    async fn call(&self, request: Vec<u8>) -> Result<Vec<u8>> {
        self.network.handle(self.node, &request).await
    }
}

#[async_trait]
impl ChannelFactory for MockNetwork {
    async fn connect(&self, address: &str, _cert_hash: Option<&str>) -> Result<Arc<dyn Channel>> {
        let node: AccountId = address
            .strip_prefix(SCHEME)
            .ok_or_else(|| HederaError::invalid(format!("not a mock address: {address}")))?
            .parse()?;

        if self.inner.unreachable.lock().contains(&node) {
            return Err(HederaError::transport(node, "connection refused"));
        }
        if !self.inner.node_ids.contains(&node) {
            return Err(HederaError::transport(node, "no such mock node"));
        }

        self.inner.connects.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(MockChannel {
            network: self.clone(),
            node,
        }))
    }
}
