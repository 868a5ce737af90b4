//! Balance movements carried by transfer transactions and records

use crate::{AccountId, Hbar, TokenId};
use serde::{Deserialize, Serialize};

/// A signed hbar adjustment to one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HbarTransfer {
    /// Account being credited or debited
    pub account_id: AccountId,
    /// Positive for credits, negative for debits
    pub amount: Hbar,
}

/// Movement of a single NFT serial between accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenNftTransfer {
    /// Account giving up the NFT
    pub sender: AccountId,
    /// Account receiving the NFT
    pub receiver: AccountId,
    /// Serial number of the NFT
    pub serial: i64,
}

/// NFT movements grouped by token type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenNftTransferList {
    /// Token the serials belong to
    pub token_id: TokenId,
    /// Individual serial movements, kept sorted
    pub transfers: Vec<TokenNftTransfer>,
}
