//! Block body and post-execution validation.

use alloy_consensus::{EMPTY_OMMER_ROOT_HASH, Transaction as _, TxEnvelope};
use alloy_primitives::{Address, map::HashMap};
use strata_domain::{Block, Header};

use crate::{RevisionPolicy, ValidationError};

/// Validate a block body against its header under revision `R`.
///
/// Covers the rules that need no recovered senders: ommers, withdrawals presence and
/// authorization list gating.
pub fn validate_block<R: RevisionPolicy>(block: &Block) -> Result<(), ValidationError> {
    let ommers = block.body.ommers.len();
    if ommers != 0 {
        return Err(ValidationError::UnexpectedOmmers(ommers));
    }
    if block.header.ommers_hash != EMPTY_OMMER_ROOT_HASH {
        return Err(ValidationError::InvalidOmmersHash);
    }

    match (R::RULES.withdrawals, block.body.withdrawals.is_some()) {
        (true, false) => return Err(ValidationError::MissingWithdrawals),
        (false, true) => return Err(ValidationError::UnexpectedWithdrawals),
        _ => {}
    }

    for (index, tx) in block.body.transactions.iter().enumerate() {
        if let TxEnvelope::Eip7702(signed) = tx {
            if !R::RULES.authorizations {
                return Err(ValidationError::AuthorizationsNotActive { index });
            }
            if signed.tx().authorization_list.is_empty() {
                return Err(ValidationError::EmptyAuthorizationList { index });
            }
        }
    }
    Ok(())
}

/// Validate transactions against their recovered senders under revision `R`.
///
/// When nonce ordering is active, each sender's nonces must be contiguous in block order.
pub fn validate_body<R: RevisionPolicy>(
    senders: &[Address],
    transactions: &[TxEnvelope],
) -> Result<(), ValidationError> {
    if !R::RULES.nonce_ordering {
        return Ok(());
    }
    let mut next_nonce: HashMap<Address, u64> = HashMap::default();
    for (index, (sender, tx)) in senders.iter().zip(transactions).enumerate() {
        let got = tx.nonce();
        if let Some(&expected) = next_nonce.get(sender)
            && expected != got
        {
            return Err(ValidationError::NonceGap { index, sender: *sender, expected, got });
        }
        next_nonce.insert(*sender, got.saturating_add(1));
    }
    Ok(())
}

/// Compare the header produced by the commit with the header the block declared.
pub fn validate_output_header(declared: &Header, output: &Header) -> Result<(), ValidationError> {
    fn check<T: PartialEq + std::fmt::Debug>(
        field: &'static str,
        expected: &T,
        got: &T,
    ) -> Result<(), ValidationError> {
        if expected == got {
            return Ok(());
        }
        Err(ValidationError::OutputHeaderMismatch {
            field,
            expected: format!("{expected:?}"),
            got: format!("{got:?}"),
        })
    }

    check("gas_used", &declared.gas_used, &output.gas_used)?;
    check("state_root", &declared.state_root, &output.state_root)?;
    check("receipts_root", &declared.receipts_root, &output.receipts_root)?;
    check("logs_bloom", &declared.logs_bloom, &output.logs_bloom)?;
    check("transactions_root", &declared.transactions_root, &output.transactions_root)?;
    check("withdrawals_root", &declared.withdrawals_root, &output.withdrawals_root)
}
