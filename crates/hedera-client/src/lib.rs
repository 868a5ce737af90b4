//! Hedera Client: transaction and query execution against a ledger network
//!
//! The crate is organised around one execution engine ([`execute`]) shared
//! by every operation:
//!
//! - [`network`]: node addresses, the node registry and per-node health
//! - [`channel`]: the transport capability and the shared channel pool
//! - [`signing`]: per-node request addressing and signature collection
//! - [`transaction`]: transaction builders, chunked submission, responses
//! - [`query`]: query builders, payment negotiation, receipt polling
//!
//! A [`Client`] ties these together and is built from a [`ClientBuilder`]
//! or a [`ClientConfig`].

#![forbid(unsafe_code)]

pub mod cancel;
pub mod channel;
pub mod client;
pub mod config;
pub mod execute;
pub mod network;
pub mod query;
pub mod signing;
pub mod transaction;

pub use cancel::{CancellationToken, ExecutionHandle};
pub use channel::{Channel, ChannelFactory, ChannelPool};
pub use client::{Client, ClientBuilder, Operator};
pub use config::ClientConfig;
pub use execute::{Execute, Outcome};
pub use network::{BackoffConfig, Network, NodeAddress, NodeRegistry, NodeSelection, SelectionOrder};
pub use query::{
    AccountBalance, AccountBalanceQuery, FileInfoQuery, Query, QueryData, TransactionReceiptQuery,
    TransactionRecordQuery,
};
pub use transaction::{
    TopicMessageSubmitTransaction, Transaction, TransactionData, TransactionResponse,
    TransferTransaction,
};

pub use hedera_core;
