//! Responses to accepted transactions

use crate::cancel::{block_on, CancellationToken};
use crate::query::{TransactionReceiptQuery, TransactionRecordQuery};
use crate::Client;
use hedera_core::{AccountId, Result, TransactionId, TransactionReceipt, TransactionRecord};

/// A transaction a node accepted for consensus
///
/// Acceptance only means the node passed precheck. The receipt tells
/// whether the ledger actually applied the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    /// Node that accepted the transaction
    pub node_id: AccountId,
    /// Identity of the transaction
    pub transaction_id: TransactionId,
    /// SHA-384 of the signed transaction as submitted
    pub transaction_hash: Vec<u8>,
    /// Transaction this one scheduled, when its payload schedules one
    pub scheduled_transaction_id: Option<TransactionId>,
    /// Whether a failed receipt is surfaced as an error
    pub validate_status: bool,
}

impl TransactionResponse {
    pub(crate) fn new(
        node_id: AccountId,
        transaction_id: TransactionId,
        transaction_hash: Vec<u8>,
        scheduled_transaction_id: Option<TransactionId>,
    ) -> Self {
        Self {
            node_id,
            transaction_id,
            transaction_hash,
            scheduled_transaction_id,
            validate_status: true,
        }
    }

    /// Return failed receipts as values instead of errors
    pub fn validate_status(mut self, validate: bool) -> Self {
        self.validate_status = validate;
        self
    }

    /// Receipt lookup for this transaction, preferring the accepting node
    pub fn receipt_query(&self) -> TransactionReceiptQuery {
        let mut query = TransactionReceiptQuery::new(self.transaction_id);
        query.node_preference(self.node_id).validate_status(self.validate_status);
        query
    }

    /// Receipt lookup for the scheduled transaction, if there is one
    ///
    /// A scheduled transaction executes once its signatures are collected,
    /// so this lookup is not tied to the accepting node.
    pub fn scheduled_receipt_query(&self) -> Option<TransactionReceiptQuery> {
        self.scheduled_transaction_id.map(|id| {
            let mut query = TransactionReceiptQuery::new(id);
            query.validate_status(self.validate_status);
            query
        })
    }

    /// Wait for the transaction to reach consensus
    pub async fn get_receipt(&self, client: &Client) -> Result<TransactionReceipt> {
        self.receipt_query().execute(client).await
    }

    pub(crate) async fn get_receipt_with_cancel(
        &self,
        client: &Client,
        cancel: Option<&CancellationToken>,
    ) -> Result<TransactionReceipt> {
        self.receipt_query().execute_inner(client, cancel).await
    }

    /// Wait for consensus, then fetch the full record
    pub async fn get_record(&self, client: &Client) -> Result<TransactionRecord> {
        self.get_receipt(client).await?;

        let mut query = TransactionRecordQuery::for_transaction(self.transaction_id);
        query.node_preference(self.node_id);
        query.execute(client).await
    }

    /// [`get_receipt`](Self::get_receipt) from synchronous code
    ///
    /// Must not be called from within an async context.
    pub fn get_receipt_blocking(&self, client: &Client) -> Result<TransactionReceipt> {
        block_on(self.get_receipt(client))
    }

    /// [`get_record`](Self::get_record) from synchronous code
    ///
    /// Must not be called from within an async context.
    pub fn get_record_blocking(&self, client: &Client) -> Result<TransactionRecord> {
        block_on(self.get_record(client))
    }
}
