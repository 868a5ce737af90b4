//! Receipt lookup and polling
//!
//! A receipt lookup goes through the execution engine like any other query,
//! which absorbs transport failures and busy nodes. On top of that the
//! poller keeps asking while the ledger reports the transaction as still
//! pending, with its own backoff, until a final status arrives or the time
//! budget runs out. The identity asked about never changes between polls.

use super::unexpected_answer;
use crate::cancel::{block_on, cancellable, CancellationToken, ExecutionHandle};
use crate::execute::{self, precheck_outcome, Execute, Outcome};
use crate::network::NodeSelection;
use crate::Client;
use hedera_core::proto::{self, QueryAnswer, QueryHeader, Request, Response, ResponseType};
use hedera_core::{AccountId, HederaError, Result, Status, TransactionId, TransactionReceipt};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// What a receipt status says about the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptState {
    /// Not final yet; ask again
    Pending,
    /// Applied by the ledger
    Success,
    /// Finalized with a failure
    Failed,
}

/// Statuses meaning consensus has not been reached yet
const PENDING: &[Status] = &[
    Status::Unknown,
    Status::Busy,
    Status::Ok,
    Status::ReceiptNotFound,
    Status::RecordNotFound,
];

/// Classify a receipt status
pub fn receipt_state(status: Status) -> ReceiptState {
    if status == Status::Success {
        ReceiptState::Success
    } else if PENDING.contains(&status) {
        ReceiptState::Pending
    } else {
        ReceiptState::Failed
    }
}

/// Looks up the receipt of a transaction, waiting for consensus
#[derive(Debug, Clone)]
pub struct TransactionReceiptQuery {
    transaction_id: TransactionId,
    node_account_ids: Option<Vec<AccountId>>,
    preferred_node: Option<AccountId>,
    validate_status: bool,
    max_attempts: Option<u32>,
    request_timeout: Option<Duration>,
}

impl TransactionReceiptQuery {
    /// Receipt lookup for `transaction_id`
    pub fn new(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            node_account_ids: None,
            preferred_node: None,
            validate_status: true,
            max_attempts: None,
            request_timeout: None,
        }
    }

    /// Restrict lookups to these nodes
    pub fn node_account_ids(&mut self, nodes: impl IntoIterator<Item = AccountId>) -> &mut Self {
        self.node_account_ids = Some(nodes.into_iter().collect());
        self
    }

    /// Ask `node` while it is healthy, otherwise any node
    pub fn node_preference(&mut self, node: AccountId) -> &mut Self {
        self.preferred_node = Some(node);
        self
    }

    /// Whether a failed receipt is returned as an error (default) or a value
    pub fn validate_status(&mut self, validate: bool) -> &mut Self {
        self.validate_status = validate;
        self
    }

    /// Attempt cap per lookup
    pub fn max_attempts(&mut self, attempts: u32) -> &mut Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Overall time budget for polling
    pub fn request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Poll until the receipt is final
    pub async fn execute(&self, client: &Client) -> Result<TransactionReceipt> {
        self.execute_inner(client, None).await
    }

    /// Poll until the receipt is final or `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        client: &Client,
        cancel: &CancellationToken,
    ) -> Result<TransactionReceipt> {
        self.execute_inner(client, Some(cancel)).await
    }

    /// Poll from synchronous code
    ///
    /// Drives the polling on a private current-thread runtime, so it must
    /// not be called from within an async context.
    pub fn execute_blocking(&self, client: &Client) -> Result<TransactionReceipt> {
        block_on(self.execute(client))
    }

    /// Poll on a background task
    pub fn execute_spawned(&self, client: &Client) -> ExecutionHandle<TransactionReceipt> {
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
    ) -> Result<TransactionReceipt> {
        let timeout = self.request_timeout.unwrap_or_else(|| client.request_timeout());
        let deadline = Instant::now() + timeout;
        let backoff = client.registry().backoff();
        let mut polls = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(HederaError::DeadlineExceeded {
                    attempts: polls,
                    last: Some(Box::new(HederaError::ReceiptPending {
                        status: Status::Unknown,
                        transaction_id: self.transaction_id,
                    })),
                });
            }

            let lookup = ReceiptLookup {
                query: self,
                request_timeout: remaining,
            };
            let receipt = execute::execute(client, &lookup, cancel).await?;
            polls += 1;

            match receipt_state(receipt.status) {
                ReceiptState::Success => return Ok(receipt),
                ReceiptState::Failed if self.validate_status => {
                    return Err(HederaError::ReceiptFailed {
                        status: receipt.status,
                        transaction_id: self.transaction_id,
                        receipt: Box::new(receipt),
                    });
                }
                ReceiptState::Failed => return Ok(receipt),
                ReceiptState::Pending => {
                    let delay = backoff.delay_with_jitter(polls - 1);
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    debug!(
                        transaction_id = %self.transaction_id,
                        status = %receipt.status,
                        polls,
                        delay_ms = delay.as_millis() as u64,
                        "Receipt pending"
                    );
                    if delay >= remaining {
                        return Err(HederaError::DeadlineExceeded {
                            attempts: polls,
                            last: Some(Box::new(HederaError::ReceiptPending {
                                status: receipt.status,
                                transaction_id: self.transaction_id,
                            })),
                        });
                    }
                    cancellable(cancel, tokio::time::sleep(delay)).await?;
                }
            }
        }
    }
}

/// One engine-driven receipt lookup
struct ReceiptLookup<'a> {
    query: &'a TransactionReceiptQuery,
    request_timeout: Duration,
}

impl Execute for ReceiptLookup<'_> {
    type Output = TransactionReceipt;

    fn node_selection(&self) -> NodeSelection {
        match (&self.query.node_account_ids, self.query.preferred_node) {
            (Some(nodes), _) => NodeSelection::Pinned(nodes.clone()),
            (None, Some(node)) => NodeSelection::Preferred(node),
            (None, None) => NodeSelection::Any,
        }
    }

    fn max_attempts(&self) -> Option<u32> {
        self.query.max_attempts
    }

    fn request_timeout(&self) -> Option<Duration> {
        Some(self.request_timeout)
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        Some(self.query.transaction_id)
    }

    fn make_request(&self, _client: &Client, _node: AccountId) -> Result<Request> {
        Ok(Request::Query(proto::Query {
            header: QueryHeader {
                payment: None,
                response_type: ResponseType::AnswerOnly,
            },
            data: proto::QueryData::TransactionGetReceipt {
                transaction_id: self.query.transaction_id,
            },
        }))
    }

    /// A node that has not seen the transaction yet answers at precheck;
    /// that is a pending receipt, not a rejection.
    fn classify(&self, status: Status, _response: &Response) -> Outcome {
        match status {
            Status::ReceiptNotFound | Status::RecordNotFound | Status::Unknown => Outcome::Accepted,
            other => precheck_outcome(other),
        }
    }

    fn make_response(&self, response: Response, _node: AccountId) -> Result<TransactionReceipt> {
        let precheck = response.precheck();
        let mut receipt = match response.into_answer() {
            Some(QueryAnswer::Receipt(receipt)) => receipt,
            None => TransactionReceipt::with_status(precheck),
            Some(_) => return Err(unexpected_answer("receipt", precheck)),
        };
        receipt.transaction_id.get_or_insert(self.query.transaction_id);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_states() {
        assert_eq!(receipt_state(Status::Success), ReceiptState::Success);
        for pending in PENDING {
            assert_eq!(receipt_state(*pending), ReceiptState::Pending);
        }
        assert_eq!(receipt_state(Status::InvalidSignature), ReceiptState::Failed);
        assert_eq!(receipt_state(Status::Unrecognized(9_999)), ReceiptState::Failed);
    }
}
