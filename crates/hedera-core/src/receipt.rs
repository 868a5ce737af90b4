//! Transaction receipts
//!
//! A receipt is the consensus outcome of a transaction as recorded by the
//! ledger. Nodes keep receipts for a few minutes after consensus.

use crate::{AccountId, FileId, Status, Timestamp, TokenId, TopicId, TransactionId};
use serde::{Deserialize, Serialize};

/// Hbar to USD-cent conversion in effect when a transaction was processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Hbar side of the rate
    pub hbars: i32,
    /// Cent side of the rate
    pub cents: i32,
    /// When the rate stops applying
    pub expiration_time: Timestamp,
}

/// Outcome of a transaction once it has reached consensus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Transaction this receipt belongs to
    pub transaction_id: Option<TransactionId>,
    /// Consensus status
    pub status: Status,
    /// Account created by the transaction
    pub account_id: Option<AccountId>,
    /// File created by the transaction
    pub file_id: Option<FileId>,
    /// Topic created by the transaction
    pub topic_id: Option<TopicId>,
    /// Token created by the transaction
    pub token_id: Option<TokenId>,
    /// Sequence number of a submitted topic message
    pub topic_sequence_number: Option<u64>,
    /// Serials minted by the transaction
    pub serials: Vec<i64>,
    /// Exchange rate snapshot at consensus
    pub exchange_rate: Option<ExchangeRate>,
}

impl TransactionReceipt {
    /// Receipt carrying only a status
    pub fn with_status(status: Status) -> Self {
        Self {
            transaction_id: None,
            status,
            account_id: None,
            file_id: None,
            topic_id: None,
            token_id: None,
            topic_sequence_number: None,
            serials: Vec::new(),
            exchange_rate: None,
        }
    }
}
