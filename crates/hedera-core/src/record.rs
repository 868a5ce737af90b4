//! Transaction records: the receipt plus the full effect of a transaction

use crate::transfer::TokenNftTransferList;
use crate::{Hbar, HbarTransfer, Timestamp, TransactionId, TransactionReceipt};
use serde::{Deserialize, Serialize};

/// Detailed consensus result of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Receipt embedded in the record
    pub receipt: TransactionReceipt,
    /// SHA-384 hash of the signed transaction
    pub transaction_hash: Vec<u8>,
    /// Consensus time of the transaction
    pub consensus_timestamp: Timestamp,
    /// Transaction this record belongs to
    pub transaction_id: TransactionId,
    /// Memo attached to the transaction
    pub memo: String,
    /// Fee actually charged
    pub transaction_fee: Hbar,
    /// Hbar movements, fees included
    pub transfers: Vec<HbarTransfer>,
    /// NFT movements
    pub nft_transfers: Vec<TokenNftTransferList>,
}
