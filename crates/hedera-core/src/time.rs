//! Ledger timestamps
//!
//! Timestamps are seconds plus nanoseconds since the Unix epoch, the same
//! resolution transaction valid-start times are expressed in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Point in time with nanosecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch
    pub seconds: i64,
    /// Nanoseconds within the second, always below one billion
    pub nanos: u32,
}

impl Timestamp {
    /// Create a timestamp, normalising excess nanoseconds into seconds
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self::from_unix_nanos(i128::from(seconds) * NANOS_PER_SECOND + i128::from(nanos))
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    /// Build from total nanoseconds since the epoch
    pub fn from_unix_nanos(total: i128) -> Self {
        Self {
            seconds: total.div_euclid(NANOS_PER_SECOND) as i64,
            nanos: total.rem_euclid(NANOS_PER_SECOND) as u32,
        }
    }

    /// Total nanoseconds since the epoch
    pub fn as_unix_nanos(&self) -> i128 {
        i128::from(self.seconds) * NANOS_PER_SECOND + i128::from(self.nanos)
    }

    /// Timestamp `nanos` nanoseconds later
    pub fn plus_nanos(&self, nanos: u64) -> Self {
        Self::from_unix_nanos(self.as_unix_nanos() + i128::from(nanos))
    }

    /// Timestamp `duration` earlier
    pub fn minus(&self, duration: Duration) -> Self {
        Self::from_unix_nanos(self.as_unix_nanos() - duration.as_nanos() as i128)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Self::from_unix_nanos(since.as_nanos() as i128),
            Err(before) => Self::from_unix_nanos(-(before.duration().as_nanos() as i128)),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}
