//! Recovery and validation over signed blocks.

use alloy_consensus::{
    EMPTY_OMMER_ROOT_HASH, SignableTransaction as _, TxEip1559, TxEip7702, TxEnvelope,
};
use alloy_eips::{eip4895::Withdrawals, eip7702::Authorization};
use alloy_primitives::{Address, B256, Bytes, Signature, TxKind, U256, keccak256};
use k256::{ecdsa::SigningKey, elliptic_curve::rand_core::OsRng};
use rayon::ThreadPool;
use rstest::rstest;
use strata_domain::{AddressSet, Block, BlockBody, Header};
use strata_executor::{
    RevisionOne, RevisionTwo, RevisionZero, ValidationError, recover_block, validate_block,
    validate_body,
};

fn address_of(key: &SigningKey) -> Address {
    let pubkey = key.verifying_key().to_encoded_point(false);
    Address::from_slice(&keccak256(&pubkey.as_bytes()[1..])[12..])
}

fn sign(key: &SigningKey, hash: B256) -> Signature {
    let (sig, recovery_id) = key.sign_prehash_recoverable(hash.as_slice()).unwrap();
    Signature::new(
        U256::from_be_slice(&sig.r().to_bytes()),
        U256::from_be_slice(&sig.s().to_bytes()),
        recovery_id.is_y_odd(),
    )
}

fn transfer(key: &SigningKey, nonce: u64) -> TxEnvelope {
    let tx = TxEip1559 {
        chain_id: 1,
        nonce,
        gas_limit: 21_000,
        max_fee_per_gas: 2_000_000_000,
        max_priority_fee_per_gas: 1_000_000_000,
        to: TxKind::Call(Address::repeat_byte(0x44)),
        value: U256::from(1),
        access_list: Default::default(),
        input: Bytes::new(),
    };
    let signature = sign(key, tx.signature_hash());
    TxEnvelope::from(tx.into_signed(signature))
}

fn delegation(key: &SigningKey, nonce: u64, authority: &SigningKey) -> TxEnvelope {
    let auth = Authorization { chain_id: U256::from(1), address: Address::repeat_byte(0x22), nonce: 0 };
    let signed_auth = {
        let signature = sign(authority, auth.signature_hash());
        auth.into_signed(signature)
    };
    let tx = TxEip7702 {
        chain_id: 1,
        nonce,
        gas_limit: 100_000,
        max_fee_per_gas: 2_000_000_000,
        max_priority_fee_per_gas: 1_000_000_000,
        to: Address::repeat_byte(0x33),
        value: U256::ZERO,
        access_list: Default::default(),
        authorization_list: vec![signed_auth],
        input: Bytes::new(),
    };
    let signature = sign(key, tx.signature_hash());
    TxEnvelope::from(tx.into_signed(signature))
}

fn block(transactions: Vec<TxEnvelope>, withdrawals: bool) -> Block {
    let header = Header {
        number: 1,
        gas_limit: 30_000_000,
        base_fee_per_gas: Some(1),
        ommers_hash: EMPTY_OMMER_ROOT_HASH,
        ..Default::default()
    };
    let body = BlockBody { transactions, ommers: Vec::new(), withdrawals: withdrawals.then(Withdrawals::default) };
    Block { header, body }
}

fn pool() -> ThreadPool {
    rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap()
}

#[test]
fn interleaved_senders_keep_block_order() {
    let (alice, bob) = (SigningKey::random(&mut OsRng), SigningKey::random(&mut OsRng));
    let block = block(vec![transfer(&alice, 0), transfer(&bob, 5), transfer(&alice, 1)], true);

    let recovered = recover_block(&block.body.transactions, &pool());
    let senders = recovered.senders().unwrap();
    assert_eq!(senders, vec![address_of(&alice), address_of(&bob), address_of(&alice)]);
    assert!(recovered.authorities.iter().all(Vec::is_empty));

    validate_block::<RevisionOne>(&block).unwrap();
    validate_body::<RevisionOne>(&senders, &block.body.transactions).unwrap();
}

#[rstest]
#[case::reordered(vec![1, 0], 1, 2, 0)]
#[case::skipped(vec![0, 2], 1, 1, 2)]
fn nonce_gaps_are_reported_once_ordering_is_active(
    #[case] nonces: Vec<u64>,
    #[case] index: usize,
    #[case] expected: u64,
    #[case] got: u64,
) {
    let key = SigningKey::random(&mut OsRng);
    let txs: Vec<_> = nonces.iter().map(|nonce| transfer(&key, *nonce)).collect();
    let senders = recover_block(&txs, &pool()).senders().unwrap();

    assert!(validate_body::<RevisionZero>(&senders, &txs).is_ok());
    assert_eq!(
        validate_body::<RevisionOne>(&senders, &txs),
        Err(ValidationError::NonceGap { index, sender: address_of(&key), expected, got })
    );
}

#[test]
fn delegations_need_the_authorization_revision() {
    let (sender, authority) = (SigningKey::random(&mut OsRng), SigningKey::random(&mut OsRng));
    let block = block(vec![transfer(&sender, 0), delegation(&sender, 1, &authority)], true);

    assert_eq!(
        validate_block::<RevisionOne>(&block),
        Err(ValidationError::AuthorizationsNotActive { index: 1 })
    );
    validate_block::<RevisionTwo>(&block).unwrap();

    let recovered = recover_block(&block.body.transactions, &pool());
    assert_eq!(recovered.authorities, vec![vec![], vec![Some(address_of(&authority))]]);

    let senders = recovered.senders().unwrap();
    let set = AddressSet::from_recovered(&senders, &recovered.authorities);
    assert_eq!(set.len(), 2);
    assert!(set.contains(&address_of(&sender)));
    assert!(set.contains(&address_of(&authority)));
}

#[test]
fn withdrawals_are_required_once_active() {
    let block = block(Vec::new(), false);
    assert_eq!(validate_block::<RevisionOne>(&block), Err(ValidationError::MissingWithdrawals));
    assert!(validate_block::<RevisionZero>(&block).is_ok());
}

#[test]
fn withdrawals_are_rejected_before_they_activate() {
    let block = block(Vec::new(), true);
    assert_eq!(validate_block::<RevisionZero>(&block), Err(ValidationError::UnexpectedWithdrawals));
}
