//! Queries
//!
//! [`Query`] carries what every query shares: node restrictions, payment
//! policy and budgets. The question itself and the interpretation of the
//! answer come from a [`QueryData`] implementation.
//!
//! Paid queries go through payment negotiation first (see [`payment`]);
//! receipt lookups have their own polling driver (see [`receipt`]).

mod account_balance;
mod file_info;
pub mod payment;
pub mod receipt;
mod record;

pub use account_balance::{AccountBalance, AccountBalanceData, AccountBalanceQuery};
pub use file_info::{FileInfoData, FileInfoQuery};
pub use receipt::TransactionReceiptQuery;
pub use record::{TransactionRecordData, TransactionRecordQuery};

use crate::cancel::{block_on, CancellationToken, ExecutionHandle};
use crate::execute::{self, precheck_outcome, Execute, Outcome};
use crate::network::NodeSelection;
use crate::Client;
use hedera_core::proto::{self, QueryHeader, Request, Response, ResponseType};
use hedera_core::{AccountId, Hbar, HederaError, Result, Status, TransactionId};
use payment::PaymentPlan;
use std::time::Duration;

/// Question and answer of one query kind
pub trait QueryData: Clone + Send + Sync + 'static {
    /// Value the answer is turned into
    type Response: Send + 'static;

    /// Operation-specific part of the request
    fn to_query_data(&self) -> Result<proto::QueryData>;

    /// Whether nodes charge for the answer
    fn is_paid(&self) -> bool {
        true
    }

    /// Transaction the query is about, for error context
    fn transaction_id(&self) -> Option<TransactionId> {
        None
    }

    /// Classify the answer's precheck status
    fn classify(&self, status: Status) -> Outcome {
        precheck_outcome(status)
    }

    /// Interpret an accepted response
    fn make_response(&self, response: Response) -> Result<Self::Response>;
}

/// A query under construction
#[derive(Debug, Clone)]
pub struct Query<D> {
    data: D,
    node_account_ids: Option<Vec<AccountId>>,
    preferred_node: Option<AccountId>,
    payment: Option<Hbar>,
    max_query_payment: Option<Hbar>,
    max_attempts: Option<u32>,
    request_timeout: Option<Duration>,
}

impl<D: QueryData + Default> Query<D> {
    /// Empty query
    pub fn new() -> Self {
        Self::with_data(D::default())
    }
}

impl<D: QueryData + Default> Default for Query<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: QueryData> Query<D> {
    /// Query asking `data`
    pub fn with_data(data: D) -> Self {
        Self {
            data,
            node_account_ids: None,
            preferred_node: None,
            payment: None,
            max_query_payment: None,
            max_attempts: None,
            request_timeout: None,
        }
    }

    /// Question being asked
    pub fn data(&self) -> &D {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    /// Restrict the query to these nodes
    pub fn node_account_ids(&mut self, nodes: impl IntoIterator<Item = AccountId>) -> &mut Self {
        self.node_account_ids = Some(nodes.into_iter().collect());
        self
    }

    /// Ask `node` first, falling back to any node when it is unhealthy
    pub fn node_preference(&mut self, node: AccountId) -> &mut Self {
        self.preferred_node = Some(node);
        self
    }

    /// Pay exactly `amount`, skipping the cost probe
    pub fn query_payment(&mut self, amount: Hbar) -> &mut Self {
        self.payment = Some(amount);
        self
    }

    /// Refuse to pay more than `max` for this query
    pub fn max_query_payment(&mut self, max: Hbar) -> &mut Self {
        self.max_query_payment = Some(max);
        self
    }

    /// Attempt cap for this query
    pub fn max_attempts(&mut self, attempts: u32) -> &mut Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Overall time budget for this query
    pub fn request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Ask the network what the answer would cost
    pub async fn get_cost(&self, client: &Client) -> Result<Hbar> {
        payment::probe_cost(self, client, None).await
    }

    /// Run the query
    pub async fn execute(&self, client: &Client) -> Result<D::Response> {
        self.execute_inner(client, None).await
    }

    /// Run the query, stopping early if `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        client: &Client,
        cancel: &CancellationToken,
    ) -> Result<D::Response> {
        self.execute_inner(client, Some(cancel)).await
    }

    /// Run the query from synchronous code
    ///
    /// Drives the execution on a private current-thread runtime, so it must
    /// not be called from within an async context.
    pub fn execute_blocking(&self, client: &Client) -> Result<D::Response> {
        block_on(self.execute(client))
    }

    /// Run the query on a background task
    pub fn execute_spawned(&self, client: &Client) -> ExecutionHandle<D::Response> {
        let token = CancellationToken::new();
        let query = self.clone();
        let client = client.clone();
        let cancel = token.clone();
        let join = tokio::spawn(async move { query.execute_inner(&client, Some(&cancel)).await });
        ExecutionHandle::new(join, token)
    }

    pub(crate) async fn execute_inner(
        &self,
        client: &Client,
        cancel: Option<&CancellationToken>,
    ) -> Result<D::Response> {
        let payment = if self.data.is_paid() {
            let amount = payment::negotiate(self, client, cancel).await?;
            Some(PaymentPlan::new(client, amount)?)
        } else {
            None
        };

        let answer = QueryExecution {
            query: self,
            response_type: ResponseType::AnswerOnly,
            payment,
        };
        execute::execute(client, &answer, cancel).await
    }

    fn node_selection(&self) -> NodeSelection {
        match (&self.node_account_ids, self.preferred_node) {
            (Some(nodes), _) => NodeSelection::Pinned(nodes.clone()),
            (None, Some(node)) => NodeSelection::Preferred(node),
            (None, None) => NodeSelection::Any,
        }
    }
}

/// One execution of a query, either for its answer or its cost
pub(crate) struct QueryExecution<'a, D> {
    pub(crate) query: &'a Query<D>,
    pub(crate) response_type: ResponseType,
    pub(crate) payment: Option<PaymentPlan>,
}

impl<D: QueryData> QueryExecution<'_, D> {
    fn request(&self, client: &Client, node: AccountId) -> Result<Request> {
        let payment = self
            .payment
            .as_ref()
            .map(|plan| plan.transaction_for(client, node))
            .transpose()?;

        Ok(Request::Query(proto::Query {
            header: QueryHeader {
                payment,
                response_type: self.response_type,
            },
            data: self.query.data.to_query_data()?,
        }))
    }
}

impl<D: QueryData> Execute for QueryExecution<'_, D> {
    type Output = D::Response;

    fn node_selection(&self) -> NodeSelection {
        self.query.node_selection()
    }

    fn max_attempts(&self) -> Option<u32> {
        self.query.max_attempts
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.query.request_timeout
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        self.query.data.transaction_id()
    }

    fn make_request(&self, client: &Client, node: AccountId) -> Result<Request> {
        self.request(client, node)
    }

    fn classify(&self, status: Status, _response: &Response) -> Outcome {
        self.query.data.classify(status)
    }

    fn make_response(&self, response: Response, _node: AccountId) -> Result<D::Response> {
        self.query.data.make_response(response)
    }
}

/// Cost-only execution of a query
pub(crate) struct CostExecution<'a, D>(pub(crate) QueryExecution<'a, D>);

impl<D: QueryData> Execute for CostExecution<'_, D> {
    type Output = Hbar;

    fn node_selection(&self) -> NodeSelection {
        self.0.node_selection()
    }

    fn max_attempts(&self) -> Option<u32> {
        self.0.max_attempts()
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.0.request_timeout()
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        self.0.transaction_id()
    }

    fn make_request(&self, client: &Client, node: AccountId) -> Result<Request> {
        self.0.request(client, node)
    }

    fn make_response(&self, response: Response, node: AccountId) -> Result<Hbar> {
        response
            .cost()
            .ok_or_else(|| HederaError::invalid(format!("node {node} answered a cost query without a cost")))
    }
}

/// Answer body missing or of the wrong kind
pub(crate) fn unexpected_answer(expected: &str, precheck: Status) -> HederaError {
    HederaError::serialization(format!(
        "expected {expected} answer, node answered with precheck {precheck}"
    ))
}
