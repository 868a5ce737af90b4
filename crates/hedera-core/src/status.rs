//! Network response status codes
//!
//! Nodes answer every request with a numeric status. The numbering is fixed
//! by the network's published response-code enumeration and must not drift;
//! codes this client does not know are kept verbatim as
//! [`Status::Unrecognized`] rather than collapsed into a known value.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! statuses {
    ($($(#[$meta:meta])* $name:ident = $code:literal => $text:literal,)*) => {
        /// Status code returned by a node or recorded in a receipt
        #[allow(missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Status {
            $($(#[$meta])* $name,)*
            /// A code outside the known enumeration
            Unrecognized(i32),
        }

        impl Status {
            /// Map a wire code to a status
            pub fn from_code(code: i32) -> Self {
                match code {
                    $($code => Self::$name,)*
                    other => Self::Unrecognized(other),
                }
            }

            /// Wire code of this status
            pub fn code(&self) -> i32 {
                match self {
                    $(Self::$name => $code,)*
                    Self::Unrecognized(code) => *code,
                }
            }

            /// Canonical upper-case name
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$name => $text,)*
                    Self::Unrecognized(_) => "UNRECOGNIZED",
                }
            }
        }
    };
}

statuses! {
    /// The transaction passed the precheck validations
    Ok = 0 => "OK",
    InvalidTransaction = 1 => "INVALID_TRANSACTION",
    PayerAccountNotFound = 2 => "PAYER_ACCOUNT_NOT_FOUND",
    InvalidNodeAccount = 3 => "INVALID_NODE_ACCOUNT",
    TransactionExpired = 4 => "TRANSACTION_EXPIRED",
    InvalidTransactionStart = 5 => "INVALID_TRANSACTION_START",
    InvalidTransactionDuration = 6 => "INVALID_TRANSACTION_DURATION",
    InvalidSignature = 7 => "INVALID_SIGNATURE",
    MemoTooLong = 8 => "MEMO_TOO_LONG",
    InsufficientTxFee = 9 => "INSUFFICIENT_TX_FEE",
    InsufficientPayerBalance = 10 => "INSUFFICIENT_PAYER_BALANCE",
    DuplicateTransaction = 11 => "DUPLICATE_TRANSACTION",
    /// The node is too busy to take the request right now
    Busy = 12 => "BUSY",
    NotSupported = 13 => "NOT_SUPPORTED",
    InvalidFileId = 14 => "INVALID_FILE_ID",
    InvalidAccountId = 15 => "INVALID_ACCOUNT_ID",
    InvalidContractId = 16 => "INVALID_CONTRACT_ID",
    InvalidTransactionId = 17 => "INVALID_TRANSACTION_ID",
    ReceiptNotFound = 18 => "RECEIPT_NOT_FOUND",
    RecordNotFound = 19 => "RECORD_NOT_FOUND",
    InvalidSolidityId = 20 => "INVALID_SOLIDITY_ID",
    /// Consensus has not been reached yet
    Unknown = 21 => "UNKNOWN",
    /// The transaction reached consensus and succeeded
    Success = 22 => "SUCCESS",
    FailInvalid = 23 => "FAIL_INVALID",
    FailFee = 24 => "FAIL_FEE",
    FailBalance = 25 => "FAIL_BALANCE",
    KeyRequired = 26 => "KEY_REQUIRED",
    BadEncoding = 27 => "BAD_ENCODING",
    InsufficientAccountBalance = 28 => "INSUFFICIENT_ACCOUNT_BALANCE",
    InvalidSolidityAddress = 29 => "INVALID_SOLIDITY_ADDRESS",
    InsufficientGas = 30 => "INSUFFICIENT_GAS",
    ContractSizeLimitExceeded = 31 => "CONTRACT_SIZE_LIMIT_EXCEEDED",
    LocalCallModificationException = 32 => "LOCAL_CALL_MODIFICATION_EXCEPTION",
    ContractRevertExecuted = 33 => "CONTRACT_REVERT_EXECUTED",
    ContractExecutionException = 34 => "CONTRACT_EXECUTION_EXCEPTION",
    InvalidReceivingNodeAccount = 35 => "INVALID_RECEIVING_NODE_ACCOUNT",
    MissingQueryHeader = 36 => "MISSING_QUERY_HEADER",
    AccountUpdateFailed = 37 => "ACCOUNT_UPDATE_FAILED",
    InvalidKeyEncoding = 38 => "INVALID_KEY_ENCODING",
    NullSolidityAddress = 39 => "NULL_SOLIDITY_ADDRESS",
    ContractUpdateFailed = 40 => "CONTRACT_UPDATE_FAILED",
    InvalidQueryHeader = 41 => "INVALID_QUERY_HEADER",
    InvalidFeeSubmitted = 42 => "INVALID_FEE_SUBMITTED",
    InvalidPayerSignature = 43 => "INVALID_PAYER_SIGNATURE",
    KeyNotProvided = 44 => "KEY_NOT_PROVIDED",
    InvalidExpirationTime = 45 => "INVALID_EXPIRATION_TIME",
    NoWaclKey = 46 => "NO_WACL_KEY",
    FileContentEmpty = 47 => "FILE_CONTENT_EMPTY",
    InvalidAccountAmounts = 48 => "INVALID_ACCOUNT_AMOUNTS",
    EmptyTransactionBody = 49 => "EMPTY_TRANSACTION_BODY",
    InvalidTransactionBody = 50 => "INVALID_TRANSACTION_BODY",
    InvalidSignatureTypeMismatchingKey = 51 => "INVALID_SIGNATURE_TYPE_MISMATCHING_KEY",
    InvalidSignatureCountMismatchingKey = 52 => "INVALID_SIGNATURE_COUNT_MISMATCHING_KEY",
    EmptyQueryBody = 57 => "EMPTY_QUERY_BODY",
    AccountIdDoesNotExist = 60 => "ACCOUNT_ID_DOES_NOT_EXIST",
    InvalidFileWacl = 62 => "INVALID_FILE_WACL",
    SerializationFailed = 63 => "SERIALIZATION_FAILED",
    TransactionOversize = 64 => "TRANSACTION_OVERSIZE",
    TransactionTooManyLayers = 65 => "TRANSACTION_TOO_MANY_LAYERS",
    ContractDeleted = 66 => "CONTRACT_DELETED",
    /// The platform is not yet accepting transactions
    PlatformNotActive = 67 => "PLATFORM_NOT_ACTIVE",
    KeyPrefixMismatch = 68 => "KEY_PREFIX_MISMATCH",
    /// The node could not hand the transaction to the platform
    PlatformTransactionNotCreated = 69 => "PLATFORM_TRANSACTION_NOT_CREATED",
    InvalidRenewalPeriod = 70 => "INVALID_RENEWAL_PERIOD",
    InvalidPayerAccountId = 71 => "INVALID_PAYER_ACCOUNT_ID",
    AccountDeleted = 72 => "ACCOUNT_DELETED",
    FileDeleted = 73 => "FILE_DELETED",
    AccountRepeatedInAccountAmounts = 74 => "ACCOUNT_REPEATED_IN_ACCOUNT_AMOUNTS",
    SettingNegativeAccountBalance = 75 => "SETTING_NEGATIVE_ACCOUNT_BALANCE",
    AutorenewDurationNotInRange = 81 => "AUTORENEW_DURATION_NOT_IN_RANGE",
    InvalidInitialBalance = 85 => "INVALID_INITIAL_BALANCE",
    PayerAccountUnauthorized = 89 => "PAYER_ACCOUNT_UNAUTHORIZED",
    TransferListSizeLimitExceeded = 92 => "TRANSFER_LIST_SIZE_LIMIT_EXCEEDED",
    ResultSizeLimitExceeded = 93 => "RESULT_SIZE_LIMIT_EXCEEDED",
    EntityNotAllowedToDelete = 100 => "ENTITY_NOT_ALLOWED_TO_DELETE",
    AuthorizationFailed = 101 => "AUTHORIZATION_FAILED",
    MaxFileSizeExceeded = 112 => "MAX_FILE_SIZE_EXCEEDED",
    ReceiverSigRequired = 113 => "RECEIVER_SIG_REQUIRED",
    InvalidTopicId = 150 => "INVALID_TOPIC_ID",
    InvalidAdminKey = 155 => "INVALID_ADMIN_KEY",
    InvalidSubmitKey = 156 => "INVALID_SUBMIT_KEY",
    Unauthorized = 157 => "UNAUTHORIZED",
    InvalidTopicMessage = 158 => "INVALID_TOPIC_MESSAGE",
    InvalidAutorenewAccount = 159 => "INVALID_AUTORENEW_ACCOUNT",
    AutorenewAccountNotAllowed = 160 => "AUTORENEW_ACCOUNT_NOT_ALLOWED",
    TopicExpired = 162 => "TOPIC_EXPIRED",
    InvalidChunkNumber = 163 => "INVALID_CHUNK_NUMBER",
    InvalidChunkTransactionId = 164 => "INVALID_CHUNK_TRANSACTION_ID",
    AccountFrozenForToken = 165 => "ACCOUNT_FROZEN_FOR_TOKEN",
    InvalidTokenId = 167 => "INVALID_TOKEN_ID",
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "UNRECOGNIZED({code})"),
            other => f.write_str(other.name()),
        }
    }
}

// Serialized as the raw code so unknown values survive a round trip.
impl Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(Self::from_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(Status::from_code(0), Status::Ok);
        assert_eq!(Status::from_code(12), Status::Busy);
        assert_eq!(Status::from_code(22), Status::Success);
        assert_eq!(Status::PlatformTransactionNotCreated.code(), 69);
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let status = Status::from_code(9_999);
        assert_eq!(status, Status::Unrecognized(9_999));
        assert_eq!(status.code(), 9_999);
        assert_eq!(status.to_string(), "UNRECOGNIZED(9999)");
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&Status::InsufficientTxFee).unwrap();
        assert_eq!(json, "9");
        let back: Status = serde_json::from_str("9").unwrap();
        assert_eq!(back, Status::InsufficientTxFee);
    }
}
