//! Transaction identity
//!
//! A transaction is identified by its payer and its valid-start time. The
//! network rejects a second submission of the same identity, so the
//! generator guarantees strictly increasing valid-start times per process
//! even when callers ask faster than the clock ticks.
//!
//! Chunked submissions derive every chunk's identity from the first one:
//! chunk `i` starts `i * interval` nanoseconds after chunk 0. Any chunk's id
//! can therefore be recomputed from the base id and the chunk index alone.

use crate::{AccountId, HederaError, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Identity of one logical transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// Account paying for the transaction
    pub account_id: AccountId,
    /// Earliest consensus time at which the transaction is valid
    pub valid_start: Timestamp,
    /// Nonce distinguishing child transactions of the same parent
    pub nonce: Option<i32>,
    /// Whether this identifies a scheduled transaction
    pub scheduled: bool,
}

impl TransactionId {
    /// Identity with an explicit valid-start time
    pub fn with_valid_start(account_id: AccountId, valid_start: Timestamp) -> Self {
        Self {
            account_id,
            valid_start,
            nonce: None,
            scheduled: false,
        }
    }

    /// Identity of chunk `index` in a family rooted at `self`
    pub fn for_chunk(&self, index: u32, interval_nanos: u64) -> Self {
        Self {
            valid_start: self
                .valid_start
                .plus_nanos(u64::from(index).saturating_mul(interval_nanos)),
            ..*self
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.valid_start)?;
        if self.scheduled {
            f.write_str("?scheduled")?;
        }
        if let Some(nonce) = self.nonce {
            write!(f, "/{nonce}")?;
        }
        Ok(())
    }
}

impl FromStr for TransactionId {
    type Err = HederaError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || HederaError::invalid(format!("expected account@seconds.nanos, got {s:?}"));

        let (rest, nonce) = match s.split_once('/') {
            Some((rest, nonce)) => (rest, Some(nonce.parse::<i32>().map_err(|_| bad())?)),
            None => (s, None),
        };
        let (rest, scheduled) = match rest.strip_suffix("?scheduled") {
            Some(rest) => (rest, true),
            None => (rest, false),
        };
        let (account, start) = rest.split_once('@').ok_or_else(bad)?;
        let (seconds, nanos) = start.split_once('.').ok_or_else(bad)?;

        Ok(Self {
            account_id: account.parse()?,
            valid_start: Timestamp::new(
                seconds.parse().map_err(|_| bad())?,
                nanos.parse().map_err(|_| bad())?,
            ),
            nonce,
            scheduled,
        })
    }
}

/// Produces unique, strictly increasing transaction identities
///
/// The valid start is the current time shifted back by a configurable skew,
/// so a local clock running slightly ahead of the network does not produce
/// transactions the nodes consider to be in the future.
#[derive(Debug)]
pub struct TransactionIdGenerator {
    clock_skew: Duration,
    last_nanos: AtomicI64,
}

impl TransactionIdGenerator {
    /// Create a generator backdating valid starts by `clock_skew`
    pub fn new(clock_skew: Duration) -> Self {
        Self {
            clock_skew,
            last_nanos: AtomicI64::new(i64::MIN),
        }
    }

    /// Fresh identity for a single transaction paid by `payer`
    pub fn generate(&self, payer: AccountId) -> TransactionId {
        self.generate_chunked(payer, 1, 0)
    }

    /// Fresh base identity for a chunked transaction
    ///
    /// The whole family `[start, start + (chunks - 1) * interval]` is
    /// reserved, so later identities never collide with a derived chunk id.
    pub fn generate_chunked(&self, payer: AccountId, chunks: u32, interval_nanos: u64) -> TransactionId {
        let span = i64::from(chunks.saturating_sub(1)).saturating_mul(interval_nanos as i64);
        let now = Timestamp::now().minus(self.clock_skew).as_unix_nanos() as i64;

        let mut prev = self.last_nanos.load(Ordering::Relaxed);
        let start = loop {
            let start = now.max(prev.saturating_add(1));
            match self.last_nanos.compare_exchange_weak(
                prev,
                start.saturating_add(span),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break start,
                Err(actual) => prev = actual,
            }
        };

        TransactionId::with_valid_start(payer, Timestamp::from_unix_nanos(i128::from(start)))
    }
}

impl Default for TransactionIdGenerator {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    const PAYER: AccountId = AccountId::new(0, 0, 2);

    #[test]
    fn test_generated_ids_strictly_increase() {
        let generator = TransactionIdGenerator::default();
        let mut previous = generator.generate(PAYER);
        for _ in 0..1_000 {
            let next = generator.generate(PAYER);
            assert!(next.valid_start > previous.valid_start);
            previous = next;
        }
    }

    #[test]
    fn test_concurrent_generation_is_unique() {
        let generator = Arc::new(TransactionIdGenerator::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || (0..500).map(|_| generator.generate(PAYER)).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
    }

    #[test]
    fn test_chunk_family_is_reserved() {
        let generator = TransactionIdGenerator::default();
        let base = generator.generate_chunked(PAYER, 5, 10);
        let last_chunk = base.for_chunk(4, 10);
        let next = generator.generate(PAYER);
        assert!(next.valid_start > last_chunk.valid_start);
    }

    #[test]
    fn test_skew_backdates_valid_start() {
        let generator = TransactionIdGenerator::new(Duration::from_secs(60));
        let id = generator.generate(PAYER);
        assert!(id.valid_start < Timestamp::now().minus(Duration::from_secs(59)));
    }

    #[test]
    fn test_display_and_parse() {
        let id = TransactionId::with_valid_start(PAYER, Timestamp::new(1_700_000_000, 42));
        assert_eq!(id.to_string(), "0.0.2@1700000000.000000042");
        assert_eq!(id.to_string().parse::<TransactionId>().unwrap(), id);

        let child = TransactionId { nonce: Some(3), scheduled: true, ..id };
        assert_eq!(child.to_string().parse::<TransactionId>().unwrap(), child);
    }

    #[test]
    fn test_chunk_three_is_base_plus_three_intervals() {
        let base = TransactionId::with_valid_start(PAYER, Timestamp::new(100, 0));
        assert_eq!(base.for_chunk(3, 250).valid_start, Timestamp::new(100, 750));
        assert_eq!(base.for_chunk(0, 250), base);
    }

    proptest! {
        /// Any chunk id is recomputable from the base id and index alone
        #[test]
        fn chunk_ids_are_derivable(seconds in 0i64..4_000_000_000, nanos in 0u32..1_000_000_000,
                                   index in 0u32..64, interval in 1u64..1_000_000) {
            let base = TransactionId::with_valid_start(PAYER, Timestamp::new(seconds, nanos));
            let derived = base.for_chunk(index, interval);
            prop_assert_eq!(
                derived.valid_start.as_unix_nanos(),
                base.valid_start.as_unix_nanos() + i128::from(index) * i128::from(interval)
            );
            prop_assert_eq!(derived, base.for_chunk(index, interval));
        }
    }
}
