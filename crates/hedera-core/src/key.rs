//! Key material and signing requirements
//!
//! Two concerns live here:
//!
//! - **Signing capability**: anything implementing [`Signer`] can contribute
//!   a signature. [`PrivateKey`] is the in-process Ed25519 implementation;
//!   remote signers and hardware wallets plug in through the same trait.
//! - **Requirements**: a [`Key`] describes who must sign. A single key needs
//!   its own signature, a [`KeyList`] without threshold needs every member,
//!   and a threshold list needs any `k` of its `n` members. Lists nest.
//!
//! Ed25519 signing is deterministic, so re-signing the same body with the
//! same key always yields the same signature.

use crate::{HederaError, Result};
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Capability to produce signatures for one public identity
pub trait Signer: Send + Sync {
    /// Public key the signatures verify against
    fn public_key(&self) -> PublicKey;

    /// Sign `message`
    fn sign(&self, message: &[u8]) -> Signature;
}

/// Ed25519 signature bytes
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0))
    }
}

/// Ed25519 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Parse a public key from its 32 raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 32] = bytes
            .try_into()
            .map_err(|_| HederaError::crypto(format!("public key must be 32 bytes, got {}", bytes.len())))?;
        VerifyingKey::from_bytes(&raw)?;
        Ok(Self(raw))
    }

    /// Raw key bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Check `signature` over `message`
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        let key = VerifyingKey::from_bytes(&self.0)?;
        let signature = ed25519_dalek::Signature::from_slice(&signature.0)?;
        key.verify(message, &signature)?;
        Ok(())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for PublicKey {
    type Err = HederaError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| HederaError::crypto(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// Ed25519 private key
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a fresh key from the OS random source
    pub fn generate() -> Self {
        Self {
            inner: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// Build a key from its 32-byte seed
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| HederaError::crypto(format!("private key must be 32 bytes, got {}", bytes.len())))?;
        Ok(Self {
            inner: SigningKey::from_bytes(&seed),
        })
    }

    /// The 32-byte seed.
    ///
    /// # Security
    ///
    /// Handle with care - this is secret key material.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Matching public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.inner.verifying_key().to_bytes())
    }
}

impl Signer for PrivateKey {
    fn public_key(&self) -> PublicKey {
        PrivateKey::public_key(self)
    }

    fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.inner.sign(message).to_bytes().to_vec())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Don't expose signing key in debug output
        f.debug_struct("PrivateKey")
            .field("signing_key", &"[REDACTED]")
            .field("public_key", &self.public_key())
            .finish()
    }
}

impl FromStr for PrivateKey {
    type Err = HederaError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| HederaError::crypto(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// A signing requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// One specific key must sign
    Single(PublicKey),
    /// A (possibly threshold) list of nested requirements
    List(KeyList),
}

impl Key {
    /// Whether signatures from `signers` meet this requirement
    pub fn is_satisfied_by(&self, signers: &HashSet<PublicKey>) -> bool {
        match self {
            Key::Single(key) => signers.contains(key),
            Key::List(list) => list.is_satisfied_by(signers),
        }
    }

    /// Every public key mentioned anywhere in this requirement
    pub fn public_keys(&self) -> Vec<PublicKey> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys(&self, out: &mut Vec<PublicKey>) {
        match self {
            Key::Single(key) => out.push(*key),
            Key::List(list) => list.keys.iter().for_each(|key| key.collect_keys(out)),
        }
    }
}

impl From<PublicKey> for Key {
    fn from(key: PublicKey) -> Self {
        Key::Single(key)
    }
}

impl From<KeyList> for Key {
    fn from(list: KeyList) -> Self {
        Key::List(list)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Single(key) => write!(f, "{key}"),
            Key::List(list) => write!(f, "{list}"),
        }
    }
}

/// Ordered list of keys, optionally with a signing threshold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyList {
    /// Member requirements
    pub keys: Vec<Key>,
    /// Members that must be satisfied; `None` means all of them
    pub threshold: Option<u32>,
}

impl KeyList {
    /// List requiring every member
    pub fn of(keys: impl IntoIterator<Item = impl Into<Key>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            threshold: None,
        }
    }

    /// List requiring any `threshold` members
    pub fn threshold(threshold: u32, keys: impl IntoIterator<Item = impl Into<Key>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            threshold: Some(threshold),
        }
    }

    /// Whether signatures from `signers` meet this list's requirement
    pub fn is_satisfied_by(&self, signers: &HashSet<PublicKey>) -> bool {
        let satisfied = self
            .keys
            .iter()
            .filter(|key| key.is_satisfied_by(signers))
            .count();

        match self.threshold {
            Some(threshold) => satisfied >= threshold as usize,
            None => satisfied == self.keys.len(),
        }
    }
}

impl fmt::Display for KeyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.threshold {
            Some(threshold) => write!(f, "{threshold}-of-{}[", self.keys.len())?,
            None => write!(f, "all-of-{}[", self.keys.len())?,
        }
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys(n: usize) -> Vec<PrivateKey> {
        (0..n)
            .map(|i| PrivateKey::from_bytes(&[i as u8 + 1; 32]).unwrap())
            .collect()
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = PrivateKey::from_bytes(&[7; 32]).unwrap();
        let first = Signer::sign(&key, b"body");
        let second = Signer::sign(&key, b"body");
        assert_eq!(first, second);
        key.public_key().verify(b"body", &first).unwrap();
        assert!(key.public_key().verify(b"other", &first).is_err());
    }

    #[test]
    fn test_key_list_requires_all() {
        let k = keys(3);
        let list = KeyList::of(k.iter().map(PrivateKey::public_key));
        let two: HashSet<_> = k[..2].iter().map(PrivateKey::public_key).collect();
        let all: HashSet<_> = k.iter().map(PrivateKey::public_key).collect();
        assert!(!list.is_satisfied_by(&two));
        assert!(list.is_satisfied_by(&all));
    }

    #[test]
    fn test_nested_requirements() {
        let k = keys(4);
        let inner = KeyList::threshold(1, [k[2].public_key(), k[3].public_key()]);
        let outer = Key::List(KeyList::of([Key::Single(k[0].public_key()), Key::List(inner)]));

        let signers: HashSet<_> = [k[0].public_key(), k[3].public_key()].into_iter().collect();
        assert!(outer.is_satisfied_by(&signers));

        let signers: HashSet<_> = [k[2].public_key(), k[3].public_key()].into_iter().collect();
        assert!(!outer.is_satisfied_by(&signers));
        assert_eq!(outer.public_keys().len(), 3);
    }

    #[test]
    fn test_private_key_hex_roundtrip() {
        let key = PrivateKey::from_bytes(&[9; 32]).unwrap();
        let parsed: PrivateKey = hex::encode(key.to_bytes()).parse().unwrap();
        assert_eq!(parsed.public_key(), key.public_key());
        assert!(!format!("{key:?}").contains(&hex::encode(key.to_bytes())));
    }

    proptest! {
        /// A 2-of-3 threshold is met by exactly the subsets with two or more members
        #[test]
        fn threshold_two_of_three(mask in 0u8..8) {
            let k = keys(3);
            let requirement = Key::List(KeyList::threshold(2, k.iter().map(PrivateKey::public_key)));
            let signers: HashSet<_> = (0..3)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| k[i].public_key())
                .collect();

            prop_assert_eq!(requirement.is_satisfied_by(&signers), signers.len() >= 2);
        }
    }
}
