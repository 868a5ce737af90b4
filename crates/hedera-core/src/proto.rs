//! Wire layer
//!
//! Request and response envelopes exchanged with nodes, plus the binary
//! encoding used on the channel. The envelope mirrors the network's
//! protocol shape: a transaction is a body serialized once and signed by
//! every required key, a query is a header (optional payment, answer type)
//! plus an operation-specific body.
//!
//! The execution engine only ever looks at the precheck status and cost in
//! a response; everything operation-specific is interpreted by the
//! operation that asked for it.

use crate::transfer::TokenNftTransferList;
use crate::{
    AccountId, FileId, FileInfo, Hbar, HbarTransfer, PublicKey, Result, Signature, Status,
    TopicId, TransactionId, TransactionReceipt, TransactionRecord,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha384};

/// Encode a wire value
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

/// Decode a wire value
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

// =============================================================================
// Transactions
// =============================================================================

/// Operation-specific payload of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionData {
    /// Move hbar and NFTs between accounts
    CryptoTransfer(CryptoTransferBody),
    /// Submit a (possibly chunked) message to a topic
    ConsensusSubmitMessage(ConsensusSubmitMessageBody),
}

/// Payload of a transfer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoTransferBody {
    /// Hbar adjustments; must sum to zero
    pub hbar_transfers: Vec<HbarTransfer>,
    /// NFT movements per token
    pub nft_transfers: Vec<TokenNftTransferList>,
}

/// Payload of a topic message submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSubmitMessageBody {
    /// Topic receiving the message
    pub topic_id: TopicId,
    /// Message bytes carried by this transaction
    pub message: Vec<u8>,
    /// Position of this chunk when the message was split
    pub chunk_info: Option<ChunkInfo>,
}

/// Links a chunk to the rest of its family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    /// Identity of the first chunk
    pub initial_transaction_id: TransactionId,
    /// 1-based chunk number
    pub number: u32,
    /// Total chunks in the family
    pub total: u32,
}

/// Body that gets signed, bound to a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    /// Identity of the transaction
    pub transaction_id: TransactionId,
    /// Node the transaction is submitted to
    pub node_account_id: AccountId,
    /// Maximum fee the payer is willing to pay
    pub transaction_fee: Hbar,
    /// Seconds after valid start during which the transaction may reach consensus
    pub transaction_valid_duration_secs: u64,
    /// Free-form memo
    pub memo: String,
    /// Operation payload
    pub data: TransactionData,
}

/// Signature by one key over a body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    /// Key that produced the signature
    pub public_key: PublicKey,
    /// Signature over the body bytes
    pub signature: Signature,
}

/// Encoded body plus its signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Encoded [`TransactionBody`]
    pub body_bytes: Vec<u8>,
    /// One entry per signing key
    pub sig_map: Vec<SignaturePair>,
}

impl SignedTransaction {
    /// Decode the signed body
    pub fn body(&self) -> Result<TransactionBody> {
        decode(&self.body_bytes)
    }

    /// Encoded form as sent on the wire
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// SHA-384 hash of the encoded signed transaction
    pub fn hash(&self) -> Result<Vec<u8>> {
        Ok(Sha384::digest(self.to_bytes()?).to_vec())
    }
}

// =============================================================================
// Queries
// =============================================================================

/// What a query asks the node to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    /// Return the answer
    AnswerOnly,
    /// Return only what the answer would cost
    CostAnswer,
}

/// Common part of every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHeader {
    /// Transfer paying the node for the answer
    pub payment: Option<SignedTransaction>,
    /// Answer or cost
    pub response_type: ResponseType,
}

/// Operation-specific part of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryData {
    /// Look up a transaction receipt
    TransactionGetReceipt {
        /// Transaction to look up
        transaction_id: TransactionId,
    },
    /// Look up a transaction record
    TransactionGetRecord {
        /// Transaction to look up
        transaction_id: TransactionId,
    },
    /// Look up an account balance
    CryptoGetAccountBalance {
        /// Account to look up
        account_id: AccountId,
    },
    /// Look up file metadata
    FileGetInfo {
        /// File to look up
        file_id: FileId,
    },
}

/// A complete query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Payment and answer type
    pub header: QueryHeader,
    /// What is being asked
    pub data: QueryData,
}

/// Anything that can be sent to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Submit a signed transaction
    Transaction(SignedTransaction),
    /// Ask a question
    Query(Query),
}

// =============================================================================
// Responses
// =============================================================================

/// Common part of every query response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    /// Precheck status of the query
    pub precheck: Status,
    /// Cost of the answer, filled for cost queries
    pub cost: u64,
}

/// Operation-specific part of a query response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryAnswer {
    /// Receipt lookup result
    Receipt(TransactionReceipt),
    /// Record lookup result
    Record(TransactionRecord),
    /// Balance lookup result
    AccountBalance {
        /// Account looked up
        account_id: AccountId,
        /// Its balance
        balance: Hbar,
    },
    /// File metadata lookup result
    FileInfo(FileInfo),
}

/// Anything a node can answer with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Answer to a transaction submission
    Transaction {
        /// Precheck status of the submission
        precheck: Status,
    },
    /// Answer to a query
    Query {
        /// Precheck and cost
        header: ResponseHeader,
        /// Answer body, absent for cost queries and rejections
        answer: Option<QueryAnswer>,
    },
}

impl Response {
    /// Precheck status regardless of response kind
    pub fn precheck(&self) -> Status {
        match self {
            Response::Transaction { precheck } => *precheck,
            Response::Query { header, .. } => header.precheck,
        }
    }

    /// Cost reported by a query response
    ///
    /// Costs beyond the representable range saturate at the largest amount,
    /// so they can never compare below a payment maximum.
    pub fn cost(&self) -> Option<Hbar> {
        match self {
            Response::Query { header, .. } => Some(Hbar::from_tinybars(
                i64::try_from(header.cost).unwrap_or(i64::MAX),
            )),
            Response::Transaction { .. } => None,
        }
    }

    /// Answer body of a query response
    pub fn into_answer(self) -> Option<QueryAnswer> {
        match self {
            Response::Query { answer, .. } => answer,
            Response::Transaction { .. } => None,
        }
    }
}
