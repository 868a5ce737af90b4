//! Unified error type for the Hedera client
//!
//! One enum covers every failure a caller can observe. Network-derived
//! variants carry the node, status and transaction id they came from so an
//! error can be logged and correlated without digging into request internals.

use crate::{AccountId, Hbar, Status, TransactionId, TransactionReceipt};

/// Unified error type for all client operations
#[derive(Debug, thiserror::Error)]
pub enum HederaError {
    /// The channel to a node could not carry the request
    #[error("Transport error talking to node {node}: {message}")]
    Transport {
        /// Node the request was addressed to
        node: AccountId,
        /// Description of the transport failure
        message: String,
    },

    /// A node answered with a transient precheck status
    #[error("Node {node} is temporarily unable to process {}: {status}", describe_tx(.transaction_id))]
    RetryablePrecheck {
        /// Status returned by the node
        status: Status,
        /// Node that answered
        node: AccountId,
        /// Transaction the request carried, if any
        transaction_id: Option<TransactionId>,
    },

    /// A node rejected the request before consensus
    #[error("Precheck of {} rejected by node {node}: {status}", describe_tx(.transaction_id))]
    PrecheckRejected {
        /// Status returned by the node
        status: Status,
        /// Node that answered
        node: AccountId,
        /// Transaction the request carried, if any
        transaction_id: Option<TransactionId>,
    },

    /// The ledger finalized the transaction with an unsuccessful status
    #[error("Receipt for transaction {transaction_id} reported failure: {status}")]
    ReceiptFailed {
        /// Final status recorded by the ledger
        status: Status,
        /// Transaction whose receipt was looked up
        transaction_id: TransactionId,
        /// Full receipt as returned by the node
        receipt: Box<TransactionReceipt>,
    },

    /// The receipt was still pending when polling gave up
    #[error("Receipt for transaction {transaction_id} still pending: {status}")]
    ReceiptPending {
        /// Last pending status observed
        status: Status,
        /// Transaction whose receipt was looked up
        transaction_id: TransactionId,
    },

    /// Attempt or time budget ran out while only retryable failures were seen
    #[error("Deadline exceeded after {attempts} attempts (last failure: {})", describe_last(.last))]
    DeadlineExceeded {
        /// Number of attempts made
        attempts: u32,
        /// Last retryable failure observed
        last: Option<Box<HederaError>>,
    },

    /// Supplied keys cannot satisfy the signing requirement
    #[error("Incomplete signature for {}: {unmet}", describe_tx(.transaction_id))]
    IncompleteSignature {
        /// Transaction being signed
        transaction_id: Option<TransactionId>,
        /// The key requirement left unsatisfied
        unmet: String,
    },

    /// Negotiated query cost is above the caller's cap
    #[error("Query cost {cost} exceeds maximum payment {maximum}")]
    PaymentExceedsMaximum {
        /// Cost reported by the probe
        cost: Hbar,
        /// Configured maximum
        maximum: Hbar,
    },

    /// The caller cancelled the execution
    #[error("Execution cancelled")]
    Cancelled,

    /// Requested node is not part of the client's network
    #[error("Node {node} is not part of the configured network")]
    UnknownNode {
        /// Node id that was requested
        node: AccountId,
    },

    /// Payload needs more chunks than allowed
    #[error("Message requires {chunks} chunks but at most {max_chunks} are allowed")]
    MaxChunksExceeded {
        /// Chunks required
        chunks: usize,
        /// Chunks allowed
        max_chunks: usize,
    },

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the configuration failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Cryptographic operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Error message describing the cryptographic failure
        message: String,
    },
}

fn describe_tx(transaction_id: &Option<TransactionId>) -> String {
    match transaction_id {
        Some(id) => format!("transaction {id}"),
        None => "query".to_string(),
    }
}

fn describe_last(last: &Option<Box<HederaError>>) -> String {
    match last {
        Some(err) => err.to_string(),
        None => "none".to_string(),
    }
}

impl HederaError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a transport error for `node`
    pub fn transport(node: AccountId, message: impl Into<String>) -> Self {
        Self::Transport {
            node,
            message: message.into(),
        }
    }

    /// Status code carried by this error, if any
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::RetryablePrecheck { status, .. }
            | Self::PrecheckRejected { status, .. }
            | Self::ReceiptFailed { status, .. }
            | Self::ReceiptPending { status, .. } => Some(*status),
            Self::DeadlineExceeded { last, .. } => last.as_ref().and_then(|err| err.status()),
            _ => None,
        }
    }

    /// Transaction id carried by this error, if any
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        match self {
            Self::RetryablePrecheck { transaction_id, .. }
            | Self::PrecheckRejected { transaction_id, .. }
            | Self::IncompleteSignature { transaction_id, .. } => transaction_id.as_ref(),
            Self::ReceiptFailed { transaction_id, .. }
            | Self::ReceiptPending { transaction_id, .. } => Some(transaction_id),
            Self::DeadlineExceeded { last, .. } => {
                last.as_ref().and_then(|err| err.transaction_id())
            }
            _ => None,
        }
    }

    /// Node that produced this error, if any
    pub fn node(&self) -> Option<AccountId> {
        match self {
            Self::Transport { node, .. }
            | Self::RetryablePrecheck { node, .. }
            | Self::PrecheckRejected { node, .. }
            | Self::UnknownNode { node } => Some(*node),
            Self::DeadlineExceeded { last, .. } => last.as_ref().and_then(|err| err.node()),
            _ => None,
        }
    }

    /// Whether the execution engine absorbs this error by retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::RetryablePrecheck { .. } | Self::ReceiptPending { .. }
        )
    }
}

/// Standard Result type for client operations
pub type Result<T> = std::result::Result<T, HederaError>;

impl From<bincode::Error> for HederaError {
    fn from(err: bincode::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for HederaError {
    fn from(err: ed25519_dalek::SignatureError) -> Self {
        Self::crypto(err.to_string())
    }
}

impl From<std::io::Error> for HederaError {
    fn from(err: std::io::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = HederaError::invalid("test message");
        assert!(matches!(err, HederaError::Invalid { .. }));
        assert_eq!(err.to_string(), "Invalid: test message");
    }

    #[test]
    fn test_deadline_exposes_last_failure_context() {
        let node = AccountId::new(0, 0, 3);
        let err = HederaError::DeadlineExceeded {
            attempts: 3,
            last: Some(Box::new(HederaError::RetryablePrecheck {
                status: Status::Busy,
                node,
                transaction_id: None,
            })),
        };

        assert_eq!(err.status(), Some(Status::Busy));
        assert_eq!(err.node(), Some(node));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("BUSY"));
    }

    #[test]
    fn test_precheck_display_names_query() {
        let err = HederaError::PrecheckRejected {
            status: Status::InsufficientTxFee,
            node: AccountId::new(0, 0, 4),
            transaction_id: None,
        };
        assert_eq!(
            err.to_string(),
            "Precheck of query rejected by node 0.0.4: INSUFFICIENT_TX_FEE"
        );
    }
}
