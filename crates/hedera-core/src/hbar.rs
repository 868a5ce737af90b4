//! Hbar amounts, stored as tinybars

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Number of tinybars in one hbar
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// An amount of hbar
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Hbar(i64);

impl Hbar {
    /// Zero hbar
    pub const ZERO: Hbar = Hbar(0);

    /// Whole hbar amount, saturating at the representable range
    pub const fn new(hbars: i64) -> Self {
        Self(hbars.saturating_mul(TINYBARS_PER_HBAR))
    }

    /// Amount given in tinybars
    pub const fn from_tinybars(tinybars: i64) -> Self {
        Self(tinybars)
    }

    /// Amount in tinybars
    pub const fn to_tinybars(&self) -> i64 {
        self.0
    }

    /// Sum, or `None` on overflow
    pub const fn checked_add(self, rhs: Hbar) -> Option<Hbar> {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Some(Hbar(sum)),
            None => None,
        }
    }

    /// Difference, or `None` on overflow
    pub const fn checked_sub(self, rhs: Hbar) -> Option<Hbar> {
        match self.0.checked_sub(rhs.0) {
            Some(difference) => Some(Hbar(difference)),
            None => None,
        }
    }
}

impl Add for Hbar {
    type Output = Hbar;

    fn add(self, rhs: Hbar) -> Hbar {
        Hbar(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Hbar {
    type Output = Hbar;

    fn sub(self, rhs: Hbar) -> Hbar {
        Hbar(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Hbar {
    type Output = Hbar;

    fn neg(self) -> Hbar {
        Hbar(self.0.saturating_neg())
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % TINYBARS_PER_HBAR == 0 {
            write!(f, "{} ℏ", self.0 / TINYBARS_PER_HBAR)
        } else {
            write!(f, "{} tℏ", self.0)
        }
    }
}
