//! Entity identifiers
//!
//! Every ledger entity is addressed as `shard.realm.num`. The concrete id
//! types share one representation and differ only in what they name.

use crate::{HederaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw `shard.realm.num` triple shared by all entity ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    /// Shard number
    pub shard: u64,
    /// Realm number
    pub realm: u64,
    /// Entity number within the realm
    pub num: u64,
}

impl EntityId {
    /// Create an entity id from its parts
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = HederaError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('.');
        let mut next = || -> Result<u64> {
            parts
                .next()
                .ok_or_else(|| HederaError::invalid(format!("expected shard.realm.num, got {s:?}")))?
                .parse::<u64>()
                .map_err(|e| HederaError::invalid(format!("bad entity id {s:?}: {e}")))
        };

        let id = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(HederaError::invalid(format!(
                "expected shard.realm.num, got {s:?}"
            )));
        }
        Ok(id)
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub EntityId);

        impl $name {
            /// Create an id from its parts
            pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
                Self(EntityId::new(shard, realm, num))
            }

            /// Entity number within the realm
            pub const fn num(&self) -> u64 {
                self.0.num
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = HederaError;

            fn from_str(s: &str) -> Result<Self> {
                s.parse().map(Self)
            }
        }

        impl From<EntityId> for $name {
            fn from(id: EntityId) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of an account, including node accounts
    AccountId
);
entity_id!(
    /// Identifier of a file
    FileId
);
entity_id!(
    /// Identifier of a consensus topic
    TopicId
);
entity_id!(
    /// Identifier of a token type
    TokenId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: AccountId = "0.0.3".parse().unwrap();
        assert_eq!(id, AccountId::new(0, 0, 3));
        assert_eq!(id.to_string(), "0.0.3");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("0.0".parse::<AccountId>().is_err());
        assert!("0.0.3.4".parse::<AccountId>().is_err());
        assert!("a.b.c".parse::<FileId>().is_err());
    }

    #[test]
    fn test_ordering_follows_parts() {
        assert!(AccountId::new(0, 0, 3) < AccountId::new(0, 0, 10));
        assert!(AccountId::new(0, 1, 0) > AccountId::new(0, 0, 99));
    }
}
