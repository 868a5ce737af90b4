//! Hedera Testkit: in-memory ledger network for tests
//!
//! [`MockNetwork`] stands in for the transport layer. Each node answers
//! from a script of [`MockReply`] values and falls back to a plausible
//! default answer when its script runs dry; every request it receives is
//! captured for inspection.

#![forbid(unsafe_code)]

pub mod logging;
pub mod network;

pub use logging::init_tracing;
pub use network::{CapturedRequest, MockNetwork, MockReply};

use hedera_core::{AccountId, PrivateKey, Result};

/// Account the mock network's operator pays from
pub const OPERATOR_ACCOUNT: AccountId = AccountId::new(0, 0, 2);

/// Deterministic key derived from `seed`
pub fn test_key(seed: u8) -> Result<PrivateKey> {
    PrivateKey::from_bytes(&[seed; 32])
}
