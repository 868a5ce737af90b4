//! Hedera Core: shared vocabulary for the ledger client
//!
//! This crate holds the types every other layer speaks in: entity ids,
//! timestamps and amounts, the network status enumeration, key material,
//! transaction identity, the records nodes hand back, and the wire layer
//! that turns requests into bytes.
//!
//! Nothing in here touches the network. The execution engine, node registry
//! and operation builders live in `hedera-client`.

#![forbid(unsafe_code)]

pub mod errors;
pub mod file_info;
pub mod hbar;
pub mod id;
pub mod key;
pub mod proto;
pub mod receipt;
pub mod record;
pub mod status;
pub mod time;
pub mod transaction_id;
pub mod transfer;

pub use errors::{HederaError, Result};
pub use file_info::FileInfo;
pub use hbar::Hbar;
pub use id::{AccountId, EntityId, FileId, TokenId, TopicId};
pub use key::{Key, KeyList, PrivateKey, PublicKey, Signature, Signer};
pub use receipt::{ExchangeRate, TransactionReceipt};
pub use record::TransactionRecord;
pub use status::Status;
pub use time::Timestamp;
pub use transaction_id::{TransactionId, TransactionIdGenerator};
pub use transfer::{HbarTransfer, TokenNftTransfer, TokenNftTransferList};
