//! Request addressing and signing
//!
//! A transaction body names the node it is submitted to, so every attempt
//! against a new node re-encodes and re-signs the body. Ed25519 signing is
//! deterministic, so signing the same body twice yields the same bytes.

use hedera_core::proto::{self, SignaturePair, SignedTransaction, TransactionBody};
use hedera_core::{HederaError, Key, PublicKey, Result, Signer};
use std::collections::HashSet;
use std::sync::Arc;

/// Encode `body` and sign it with every distinct key in `signers`
///
/// Fails with [`HederaError::IncompleteSignature`] before anything is
/// signed when the signer set cannot satisfy one of `required`.
pub fn sign_body(
    body: &TransactionBody,
    signers: &[Arc<dyn Signer>],
    required: &[Key],
) -> Result<SignedTransaction> {
    let mut seen = HashSet::new();
    let unique: Vec<_> = signers
        .iter()
        .filter(|signer| seen.insert(signer.public_key()))
        .collect();

    if let Some(unmet) = unmet_requirement(required, &seen) {
        return Err(HederaError::IncompleteSignature {
            transaction_id: Some(body.transaction_id),
            unmet: unmet.to_string(),
        });
    }

    let body_bytes = proto::encode(body)?;
    let sig_map = unique
        .into_iter()
        .map(|signer| SignaturePair {
            public_key: signer.public_key(),
            signature: signer.sign(&body_bytes),
        })
        .collect();

    Ok(SignedTransaction {
        body_bytes,
        sig_map,
    })
}

/// First requirement not satisfied by `signers`
pub fn unmet_requirement<'a>(required: &'a [Key], signers: &HashSet<PublicKey>) -> Option<&'a Key> {
    required.iter().find(|key| !key.is_satisfied_by(signers))
}

/// Check that every signature in `signed` verifies against its key
pub fn verify_signatures(signed: &SignedTransaction) -> Result<()> {
    for pair in &signed.sig_map {
        pair.public_key.verify(&signed.body_bytes, &pair.signature)?;
    }
    Ok(())
}
