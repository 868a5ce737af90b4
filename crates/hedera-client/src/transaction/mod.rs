//! Transactions
//!
//! [`Transaction`] holds everything common to every transaction kind: its
//! identity, the nodes it may be sent to, fee and validity window, memo,
//! signers and key requirements. The payload itself comes from a
//! [`TransactionData`] implementation.
//!
//! Payloads larger than one transaction are split into chunks. Chunk `i`
//! uses the identity derived from the first chunk's (see
//! [`TransactionId::for_chunk`]) and is only sent once the previous chunk
//! has reached consensus.

mod response;
mod topic_message_submit;
mod transfer;

pub use response::TransactionResponse;
pub use topic_message_submit::{TopicMessageSubmitData, TopicMessageSubmitTransaction};
pub use transfer::{TransferData, TransferTransaction};

use crate::cancel::{block_on, CancellationToken, ExecutionHandle};
use crate::execute::{self, Execute};
use crate::network::NodeSelection;
use crate::signing;
use crate::Client;
use hedera_core::proto::{self, ChunkInfo, Request, Response, TransactionBody};
use hedera_core::{AccountId, Hbar, HederaError, Key, Result, Signer, TransactionId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default window after valid start in which a transaction may reach consensus
pub const DEFAULT_TRANSACTION_VALID_DURATION: Duration = Duration::from_secs(120);

/// Payload of one transaction kind
pub trait TransactionData: Clone + Send + Sync + 'static {
    /// Payload for the whole transaction, or for one chunk of it
    fn to_transaction_data(&self, chunk: Option<&ChunkInfo>) -> proto::TransactionData;

    /// Number of transactions needed to carry the payload
    fn chunk_count(&self) -> Result<usize> {
        Ok(1)
    }

    /// Keys whose signatures the payload itself requires
    fn required_keys(&self) -> Vec<Key> {
        Vec::new()
    }

    /// Identity of the transaction this payload schedules, if any
    fn scheduled_transaction_id(&self, _transaction_id: TransactionId) -> Option<TransactionId> {
        None
    }
}

/// A transaction under construction
#[derive(Clone)]
pub struct Transaction<D> {
    data: D,
    transaction_id: Option<TransactionId>,
    node_account_ids: Option<Vec<AccountId>>,
    max_transaction_fee: Option<Hbar>,
    valid_duration: Duration,
    memo: String,
    max_attempts: Option<u32>,
    request_timeout: Option<Duration>,
    signers: Vec<Arc<dyn Signer>>,
    required_keys: Vec<Key>,
}

impl<D: TransactionData + Default> Transaction<D> {
    /// Empty transaction
    pub fn new() -> Self {
        Self::with_data(D::default())
    }
}

impl<D: TransactionData + Default> Default for Transaction<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: TransactionData> Transaction<D> {
    /// Transaction carrying `data`
    pub fn with_data(data: D) -> Self {
        Self {
            data,
            transaction_id: None,
            node_account_ids: None,
            max_transaction_fee: None,
            valid_duration: DEFAULT_TRANSACTION_VALID_DURATION,
            memo: String::new(),
            max_attempts: None,
            request_timeout: None,
            signers: Vec::new(),
            required_keys: Vec::new(),
        }
    }

    /// Payload
    pub fn data(&self) -> &D {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    /// Use an explicit identity instead of generating one
    pub fn transaction_id(&mut self, transaction_id: TransactionId) -> &mut Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Identity, once set or frozen
    pub fn get_transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    /// Restrict submission to these nodes
    pub fn node_account_ids(&mut self, nodes: impl IntoIterator<Item = AccountId>) -> &mut Self {
        self.node_account_ids = Some(nodes.into_iter().collect());
        self
    }

    /// Maximum fee the payer will pay
    pub fn max_transaction_fee(&mut self, fee: Hbar) -> &mut Self {
        self.max_transaction_fee = Some(fee);
        self
    }

    /// Consensus window after valid start
    pub fn transaction_valid_duration(&mut self, duration: Duration) -> &mut Self {
        self.valid_duration = duration;
        self
    }

    /// Free-form memo
    pub fn transaction_memo(&mut self, memo: impl Into<String>) -> &mut Self {
        self.memo = memo.into();
        self
    }

    /// Attempt cap for this transaction
    pub fn max_attempts(&mut self, attempts: u32) -> &mut Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Overall time budget for this transaction
    pub fn request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Add a signer besides the operator
    pub fn sign(&mut self, signer: impl Signer + 'static) -> &mut Self {
        self.signers.push(Arc::new(signer));
        self
    }

    /// Require `key` to be satisfied by the signers
    pub fn require_key(&mut self, key: impl Into<Key>) -> &mut Self {
        self.required_keys.push(key.into());
        self
    }

    /// Fix the identity now, generating one from `client` if none was set
    pub fn freeze_with(&mut self, client: &Client) -> Result<&mut Self> {
        if self.transaction_id.is_none() {
            let chunks = u32::try_from(self.data.chunk_count()?)
                .map_err(|_| HederaError::invalid("too many chunks"))?;
            self.transaction_id = Some(client.generate_chunked_transaction_id(chunks)?);
        }
        Ok(self)
    }

    /// Submit and return the response for the first transaction
    pub async fn execute(&self, client: &Client) -> Result<TransactionResponse> {
        self.first(self.run(client, None).await?)
    }

    /// Submit every chunk and return all responses
    pub async fn execute_all(&self, client: &Client) -> Result<Vec<TransactionResponse>> {
        self.run(client, None).await
    }

    /// Submit, stopping early if `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        client: &Client,
        cancel: &CancellationToken,
    ) -> Result<TransactionResponse> {
        self.first(self.run(client, Some(cancel)).await?)
    }

    /// Submit from synchronous code
    ///
    /// Drives the execution on a private current-thread runtime, so it must
    /// not be called from within an async context.
    pub fn execute_blocking(&self, client: &Client) -> Result<TransactionResponse> {
        block_on(self.execute(client))
    }

    /// Submit on a background task
    pub fn execute_spawned(&self, client: &Client) -> ExecutionHandle<TransactionResponse> {
        let token = CancellationToken::new();
        let transaction = self.clone();
        let client = client.clone();
        let cancel = token.clone();
        let join = tokio::spawn(async move {
            let responses = transaction.run(&client, Some(&cancel)).await?;
            transaction.first(responses)
        });
        ExecutionHandle::new(join, token)
    }

    fn first(&self, responses: Vec<TransactionResponse>) -> Result<TransactionResponse> {
        responses
            .into_iter()
            .next()
            .ok_or_else(|| HederaError::invalid("transaction produced no submissions"))
    }

    async fn run(
        &self,
        client: &Client,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<TransactionResponse>> {
        let total = self.data.chunk_count()?;
        let total_u32 =
            u32::try_from(total).map_err(|_| HederaError::invalid("too many chunks"))?;
        let base = match self.transaction_id {
            Some(id) => id,
            None => client.generate_chunked_transaction_id(total_u32)?,
        };

        let mut signers = Vec::with_capacity(self.signers.len() + 1);
        let mut required = self.required_keys.clone();
        required.extend(self.data.required_keys());
        if let Some(operator) = client.operator() {
            signers.push(Arc::clone(&operator.signer));
            if operator.account_id == base.account_id {
                required.push(Key::Single(operator.public_key()));
            }
        }
        signers.extend(self.signers.iter().cloned());

        let mut responses = Vec::with_capacity(total);
        for index in 0..total_u32 {
            let chunk = (total > 1).then(|| ChunkInfo {
                initial_transaction_id: base,
                number: index + 1,
                total: total_u32,
            });
            let submission = Submission {
                transaction: self,
                transaction_id: base.for_chunk(index, client.chunk_interval_nanos()),
                chunk,
                signers: &signers,
                required: &required,
                submitted_hash: Mutex::new(None),
            };

            let response = execute::execute(client, &submission, cancel).await?;

            if index + 1 < total_u32 {
                debug!(
                    transaction_id = %response.transaction_id,
                    chunk = index + 1,
                    total,
                    "Waiting for chunk to reach consensus"
                );
                response.get_receipt_with_cancel(client, cancel).await?;
            }
            responses.push(response);
        }

        Ok(responses)
    }
}

/// One transaction of a possibly chunked submission
struct Submission<'a, D> {
    transaction: &'a Transaction<D>,
    transaction_id: TransactionId,
    chunk: Option<ChunkInfo>,
    signers: &'a [Arc<dyn Signer>],
    required: &'a [Key],
    submitted_hash: Mutex<Option<(AccountId, Vec<u8>)>>,
}

impl<D: TransactionData> Execute for Submission<'_, D> {
    type Output = TransactionResponse;

    fn node_selection(&self) -> NodeSelection {
        match &self.transaction.node_account_ids {
            Some(nodes) => NodeSelection::Pinned(nodes.clone()),
            None => NodeSelection::Any,
        }
    }

    fn max_attempts(&self) -> Option<u32> {
        self.transaction.max_attempts
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.transaction.request_timeout
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        Some(self.transaction_id)
    }

    fn make_request(&self, client: &Client, node: AccountId) -> Result<Request> {
        let transaction = self.transaction;
        let body = TransactionBody {
            transaction_id: self.transaction_id,
            node_account_id: node,
            transaction_fee: transaction
                .max_transaction_fee
                .unwrap_or_else(|| client.default_max_transaction_fee()),
            transaction_valid_duration_secs: transaction.valid_duration.as_secs(),
            memo: transaction.memo.clone(),
            data: transaction.data.to_transaction_data(self.chunk.as_ref()),
        };
        let signed = signing::sign_body(&body, self.signers, self.required)?;
        *self.submitted_hash.lock() = Some((node, signed.hash()?));
        Ok(Request::Transaction(signed))
    }

    fn make_response(&self, _response: Response, node: AccountId) -> Result<TransactionResponse> {
        match self.submitted_hash.lock().take() {
            Some((submitted_to, transaction_hash)) if submitted_to == node => {
                Ok(TransactionResponse::new(
                    node,
                    self.transaction_id,
                    transaction_hash,
                    self.transaction
                        .data
                        .scheduled_transaction_id(self.transaction_id),
                ))
            }
            _ => Err(HederaError::invalid(format!(
                "no submission to {node} recorded for {}",
                self.transaction_id
            ))),
        }
    }
}
