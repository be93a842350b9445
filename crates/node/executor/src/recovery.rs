//! Parallel sender and authority recovery.

use alloy_consensus::TxEnvelope;
use alloy_eips::eip7702::SignedAuthorization;
use alloy_primitives::{Address, B256, U256, keccak256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use rayon::{ThreadPool, prelude::*};

use crate::RecoveryError;

/// Senders and authorities recovered from one block, in transaction order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recovered {
    /// Recovered sender per transaction.
    pub senders: Vec<Option<Address>>,
    /// Recovered authority per declared authorization, per transaction.
    pub authorities: Vec<Vec<Option<Address>>>,
}

impl Recovered {
    /// Unwrap every sender, failing on the first transaction whose sender is missing.
    pub fn senders(&self) -> Result<Vec<Address>, RecoveryError> {
        self.senders
            .iter()
            .enumerate()
            .map(|(index, sender)| sender.ok_or(RecoveryError::MissingSender { index }))
            .collect()
    }
}

/// Recover the sender of a transaction envelope.
///
/// Returns `None` when the signature is malformed, non-canonical, or does not recover
/// to a public key.
pub fn recover_sender(tx: &TxEnvelope) -> Option<Address> {
    let signature = tx.signature();
    recover_address(tx.signature_hash(), signature.r(), signature.s(), signature.v())
}

/// Recover every authority declared by a transaction.
///
/// One slot per declared authorization; transactions without an authorization list
/// yield an empty vector.
pub fn recover_tx_authorities(tx: &TxEnvelope) -> Vec<Option<Address>> {
    match tx {
        TxEnvelope::Eip7702(signed) => {
            signed.tx().authorization_list.iter().map(recover_authority).collect()
        }
        _ => Vec::new(),
    }
}

fn recover_authority(auth: &SignedAuthorization) -> Option<Address> {
    let y_odd = match auth.y_parity() {
        0 => false,
        1 => true,
        _ => return None,
    };
    recover_address(auth.inner().signature_hash(), auth.r(), auth.s(), y_odd)
}

fn recover_address(prehash: B256, r: U256, s: U256, y_odd: bool) -> Option<Address> {
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&r.to_be_bytes::<32>());
    sig_bytes[32..].copy_from_slice(&s.to_be_bytes::<32>());

    let signature = Signature::from_slice(&sig_bytes).ok()?;
    // High-s signatures are malleable and rejected.
    if signature.normalize_s().is_some() {
        return None;
    }
    let recovery_id = RecoveryId::try_from(u8::from(y_odd)).ok()?;
    let verifying_key =
        VerifyingKey::recover_from_prehash(prehash.as_slice(), &signature, recovery_id).ok()?;

    let pubkey = verifying_key.to_encoded_point(false);
    let pubkey_hash = keccak256(&pubkey.as_bytes()[1..]);
    Some(Address::from_slice(&pubkey_hash[12..]))
}

/// Recover the sender of every transaction on the worker pool.
pub fn recover_senders(txs: &[TxEnvelope], pool: &ThreadPool) -> Vec<Option<Address>> {
    pool.install(|| txs.par_iter().map(recover_sender).collect())
}

/// Recover the authorities of every transaction on the worker pool.
pub fn recover_authorities(txs: &[TxEnvelope], pool: &ThreadPool) -> Vec<Vec<Option<Address>>> {
    pool.install(|| txs.par_iter().map(recover_tx_authorities).collect())
}

/// Recover senders and authorities concurrently.
///
/// Both halves fan out across `pool`; output order always matches `txs`.
pub fn recover_block(txs: &[TxEnvelope], pool: &ThreadPool) -> Recovered {
    let (senders, authorities): (Vec<Option<Address>>, Vec<Vec<Option<Address>>>) = pool.join(
        || txs.par_iter().map(recover_sender).collect(),
        || txs.par_iter().map(recover_tx_authorities).collect(),
    );
    Recovered { senders, authorities }
}
