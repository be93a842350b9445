//! End-to-end runloop tests against in-memory collaborators.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use alloy_consensus::{
    BlockBody, EMPTY_OMMER_ROOT_HASH, Receipt, SignableTransaction as _, TxEnvelope, TxLegacy,
};
use alloy_eips::eip4895::Withdrawals;
use alloy_primitives::{Address, B256, Bytes, Log, Signature, TxKind, U256, keccak256};
use k256::{ecdsa::SigningKey, elliptic_curve::rand_core::OsRng};
use parking_lot::Mutex;
use rayon::ThreadPool;
use strata_domain::{AddressWindow, Block, BlockId, Header};
use strata_executor::{
    Attempt, BlockExecutor, BlockHashBuffer, BlockMetrics, BlockOutput, ChainSpec, ExecEvent,
    ExecEventSink, ExecutionError, ExecutionInput, RecoveryError, RevertHook, Revision,
    RevisionPolicy, RevisionZero, StrataChain, TxStateView, ValidationError, speculate,
};
use strata_runloop::{
    BlockError, BlockProcessor, RunSummary, Runloop, RunloopError, SLOW_COMMIT_THRESHOLD,
};
use strata_traits::{CommitInput, MemoryBlockStore, StateStore, StoreError};

#[derive(Debug, Default)]
struct MockState {
    headers: BTreeMap<u64, Header>,
    selected: u64,
    commits: Vec<u64>,
    finalized: Vec<u64>,
    verified: Option<u64>,
    corrupt_at: Option<u64>,
    commit_delay: Option<Duration>,
}

impl MockState {
    fn with_genesis() -> Self {
        let mut state = Self::default();
        state.headers.insert(0, Header::default());
        state
    }
}

impl StateStore for MockState {
    type Overlay = ();

    fn set_block_and_prefix(&mut self, height: u64, id: BlockId) -> Result<(), StoreError> {
        assert_eq!(id, BlockId::from_height(height));
        if !self.headers.contains_key(&height) {
            return Err(StoreError::MissingHeader(height));
        }
        self.selected = height;
        Ok(())
    }

    fn read_header(&self) -> Result<Header, StoreError> {
        self.headers.get(&self.selected).cloned().ok_or(StoreError::MissingHeader(self.selected))
    }

    fn commit(&mut self, _overlay: (), input: CommitInput<'_>) -> Result<(), StoreError> {
        assert_eq!(input.receipts.len(), input.transactions.len());
        assert_eq!(input.senders.len(), input.transactions.len());
        if let Some(delay) = self.commit_delay {
            std::thread::sleep(delay);
        }
        let mut header = input.header.clone();
        if self.corrupt_at == Some(header.number) {
            header.state_root = B256::repeat_byte(0xee);
        }
        self.selected = header.number;
        self.commits.push(header.number);
        self.headers.insert(header.number, header);
        Ok(())
    }

    fn finalize(&mut self, height: u64, id: BlockId) -> Result<(), StoreError> {
        assert_eq!(id, BlockId::from_height(height));
        self.finalized.push(height);
        Ok(())
    }

    fn update_verified_block(&mut self, height: u64) -> Result<(), StoreError> {
        self.verified = Some(height);
        Ok(())
    }
}

struct Broke;

impl TxStateView for Broke {
    fn balance(&self, _address: &Address) -> U256 {
        U256::ZERO
    }
}

#[derive(Debug, Default)]
struct MockExecutor {
    conflict_once: bool,
    tx_exec_time: Option<Duration>,
    reverts: Mutex<Vec<bool>>,
}

impl BlockExecutor<MockState> for MockExecutor {
    fn execute_block<R: RevisionPolicy>(
        &self,
        input: ExecutionInput<'_>,
        _state: &MockState,
        metrics: &BlockMetrics,
        revert: &RevertHook<'_>,
    ) -> Result<BlockOutput<()>, ExecutionError> {
        let transactions = &input.block.body.transactions;
        let mut receipts = Vec::with_capacity(transactions.len());
        for (index, tx) in transactions.iter().enumerate() {
            let mut conflicted = !self.conflict_once;
            let reverted = speculate(index, metrics, || {
                if !conflicted {
                    conflicted = true;
                    return Ok(Attempt::Conflict);
                }
                Ok(Attempt::Done(revert(&input.senders[index], tx, index, &Broke)))
            })?;
            self.reverts.lock().push(reverted);
            if let Some(elapsed) = self.tx_exec_time {
                metrics.add_tx_exec_time(elapsed);
            }
            receipts.push(Receipt::<Log> {
                status: (!reverted).into(),
                cumulative_gas_used: 21_000 * (index as u64 + 1),
                logs: Vec::new(),
            });
        }
        Ok(BlockOutput { overlay: (), receipts, call_frames: vec![Vec::new(); transactions.len()] })
    }
}

#[derive(Debug, Default)]
struct RecordingSink {
    events: Mutex<Vec<ExecEvent>>,
}

impl ExecEventSink for RecordingSink {
    fn record(&self, event: &ExecEvent) {
        self.events.lock().push(event.clone());
    }
}

struct StopAfter<'a> {
    finalized: AtomicUsize,
    limit: usize,
    stop: &'a AtomicUsize,
}

impl ExecEventSink for StopAfter<'_> {
    fn record(&self, event: &ExecEvent) {
        if matches!(event, ExecEvent::BlockFinalized { .. })
            && self.finalized.fetch_add(1, Ordering::SeqCst) + 1 >= self.limit
        {
            self.stop.store(1, Ordering::SeqCst);
        }
    }
}

fn pool() -> ThreadPool {
    rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
}

fn address_of(key: &SigningKey) -> Address {
    let pubkey = key.verifying_key().to_encoded_point(false);
    Address::from_slice(&keccak256(&pubkey.as_bytes()[1..])[12..])
}

fn signed(key: &SigningKey, nonce: u64) -> TxEnvelope {
    let tx = TxLegacy {
        chain_id: Some(1),
        nonce,
        gas_limit: 21_000,
        gas_price: 1_000_000_000,
        to: TxKind::Call(Address::repeat_byte(0x42)),
        value: U256::from(1),
        input: Bytes::new(),
    };
    let (sig, recovery_id) = key.sign_prehash_recoverable(tx.signature_hash().as_slice()).unwrap();
    let signature = Signature::new(
        U256::from_be_slice(&sig.r().to_bytes()),
        U256::from_be_slice(&sig.s().to_bytes()),
        recovery_id.is_y_odd(),
    );
    TxEnvelope::from(tx.into_signed(signature))
}

fn unsigned() -> TxEnvelope {
    let tx = TxLegacy { chain_id: Some(1), gas_limit: 21_000, ..Default::default() };
    TxEnvelope::from(tx.into_signed(Signature::new(U256::ZERO, U256::ZERO, false)))
}

fn block(height: u64, transactions: Vec<TxEnvelope>, withdrawals: bool) -> Block {
    let header = Header {
        number: height,
        timestamp: height,
        gas_limit: 30_000_000,
        gas_used: 21_000 * transactions.len() as u64,
        base_fee_per_gas: Some(1),
        ommers_hash: EMPTY_OMMER_ROOT_HASH,
        ..Default::default()
    };
    let body = BlockBody {
        transactions,
        ommers: Vec::new(),
        withdrawals: withdrawals.then(Withdrawals::default),
    };
    Block { header, body }
}

fn empty_chain(len: u64) -> MemoryBlockStore {
    (1..=len).map(|height| block(height, Vec::new(), false)).collect()
}

fn genesis_chain() -> StrataChain {
    StrataChain::new(ChainSpec::new(1).with_schedule(vec![(0, Revision::Zero)]))
}

#[test]
fn open_ended_run_logs_every_block() {
    let (chain, ledger, pool) = (genesis_chain(), empty_chain(10), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());
    let stop = AtomicUsize::new(0);
    let sink = StopAfter { finalized: AtomicUsize::new(0), limit: 3, stop: &stop };

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool).with_sink(&sink);
    let mut runloop = Runloop::new(processor, &ledger, &pool);
    let mut next_height = 1;
    let summary = runloop.run(&mut next_height, None, &stop).unwrap();

    assert_eq!(summary, RunSummary { blocks: 3, transactions: 0, gas: 0, batches: vec![1, 1, 1] });
    assert_eq!(next_height, 4);
    assert_eq!(runloop.processor().block_hashes().next_height(), 4);
    drop(runloop);
    assert_eq!(state.finalized, vec![1, 2, 3]);
    assert_eq!(state.verified, Some(3));
}

#[test]
fn bounded_run_flushes_partial_batch() {
    let (chain, ledger, pool) = (genesis_chain(), empty_chain(2500), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());
    let stop = AtomicUsize::new(0);

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool);
    let mut runloop = Runloop::new(processor, &ledger, &pool);
    let mut next_height = 1;
    let summary = runloop.run(&mut next_height, Some(2500), &stop).unwrap();

    assert_eq!(summary.blocks, 2500);
    assert_eq!(summary.batches, vec![1000, 1000, 500]);
    assert_eq!(next_height, 2501);
}

#[test]
fn slow_commit_is_not_an_error() {
    let (chain, ledger, pool) = (genesis_chain(), empty_chain(1), pool());
    let delay = SLOW_COMMIT_THRESHOLD + Duration::from_millis(50);
    let mut state = MockState { commit_delay: Some(delay), ..MockState::with_genesis() };
    let executor = MockExecutor::default();
    let stop = AtomicUsize::new(0);

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool);
    let mut next_height = 1;
    let summary =
        Runloop::new(processor, &ledger, &pool).run(&mut next_height, Some(1), &stop).unwrap();

    assert_eq!(summary.blocks, 1);
    assert_eq!(state.finalized, vec![1]);
    assert_eq!(state.verified, Some(1));
}

#[test]
fn engine_reported_exec_time_is_kept() {
    let key = SigningKey::random(&mut OsRng);
    let mut block = block(1, vec![signed(&key, 0), signed(&key, 1)], false);
    let (chain, pool) = (genesis_chain(), pool());
    let mut state = MockState::with_genesis();
    let executor =
        MockExecutor { tx_exec_time: Some(Duration::from_millis(7)), ..Default::default() };

    let mut processor = BlockProcessor::new(&chain, &mut state, &executor, &pool)
        .with_block_hashes(BlockHashBuffer::starting_at(1));
    let window = AddressWindow::new();
    let mut out = None;
    let processed = processor
        .process::<RevisionZero>(
            &mut block,
            BlockId::from_height(1),
            BlockId::parent_of(1),
            window.ancestors(),
            &mut out,
        )
        .unwrap();

    assert_eq!(processed.exec_time, Duration::from_millis(14));
    assert_eq!(processed.transactions, 2);
    assert!(out.is_some());
}

#[test]
fn exec_time_falls_back_to_the_execution_call() {
    let mut block = block(1, Vec::new(), false);
    let (chain, pool) = (genesis_chain(), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());

    let mut processor = BlockProcessor::new(&chain, &mut state, &executor, &pool)
        .with_block_hashes(BlockHashBuffer::starting_at(1));
    let window = AddressWindow::new();
    let processed = processor
        .process::<RevisionZero>(
            &mut block,
            BlockId::from_height(1),
            BlockId::parent_of(1),
            window.ancestors(),
            &mut None,
        )
        .unwrap();

    // An engine reporting nothing leaves the wall time of a near-instant call.
    assert!(processed.exec_time < SLOW_COMMIT_THRESHOLD);
}

#[test]
fn gapped_block_hash_buffer_is_rejected() {
    let (chain, ledger, pool) = (genesis_chain(), empty_chain(12), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());
    let stop = AtomicUsize::new(0);

    let mut hashes = BlockHashBuffer::starting_at(3);
    hashes.set(3, B256::repeat_byte(3)).unwrap();
    let processor =
        BlockProcessor::new(&chain, &mut state, &executor, &pool).with_block_hashes(hashes);
    let mut next_height = 10;
    let err = Runloop::new(processor, &ledger, &pool)
        .run(&mut next_height, Some(12), &stop)
        .unwrap_err();

    assert!(matches!(err, RunloopError::MisalignedBlockHashes { next: 4, start: 10 }));
    assert_eq!(next_height, 10);
    assert!(state.commits.is_empty());
}

#[test]
fn contiguous_block_hash_buffer_is_kept() {
    let (chain, ledger, pool) = (genesis_chain(), empty_chain(3), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());
    state.headers.insert(1, Header { number: 1, ..Default::default() });
    let stop = AtomicUsize::new(0);

    let mut hashes = BlockHashBuffer::starting_at(1);
    hashes.set(1, B256::repeat_byte(1)).unwrap();
    let processor =
        BlockProcessor::new(&chain, &mut state, &executor, &pool).with_block_hashes(hashes);
    let mut runloop = Runloop::new(processor, &ledger, &pool);
    let mut next_height = 2;
    runloop.run(&mut next_height, Some(3), &stop).unwrap();

    let hashes = runloop.processor().block_hashes();
    assert_eq!(hashes.get(1), Some(B256::repeat_byte(1)));
    assert_eq!(hashes.next_height(), 4);
}

#[test]
fn stop_flag_is_sampled_before_the_first_block() {
    let (chain, ledger, pool) = (genesis_chain(), empty_chain(3), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());
    let stop = AtomicUsize::new(1);

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool);
    let mut next_height = 1;
    let summary = Runloop::new(processor, &ledger, &pool).run(&mut next_height, None, &stop).unwrap();

    assert_eq!(summary, RunSummary::default());
    assert_eq!(next_height, 1);
    assert!(state.commits.is_empty());
}

#[test]
fn missing_sender_fails_block_without_commit() {
    let key = SigningKey::random(&mut OsRng);
    let ledger: MemoryBlockStore =
        [block(1, vec![signed(&key, 0), unsigned()], false)].into_iter().collect();
    let (chain, pool) = (genesis_chain(), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());
    let stop = AtomicUsize::new(0);

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool);
    let mut next_height = 1;
    let err = Runloop::new(processor, &ledger, &pool)
        .run(&mut next_height, Some(1), &stop)
        .unwrap_err();

    assert!(matches!(
        err,
        RunloopError::Block {
            height: 1,
            source: BlockError::Recovery(RecoveryError::MissingSender { index: 1 })
        }
    ));
    assert_eq!(next_height, 1);
    assert!(state.commits.is_empty());
    assert!(executor.reverts.lock().is_empty());
}

#[test]
fn missing_block_stops_the_run() {
    let (chain, ledger, pool) = (genesis_chain(), empty_chain(2), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());
    let stop = AtomicUsize::new(0);

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool);
    let mut next_height = 1;
    let err = Runloop::new(processor, &ledger, &pool)
        .run(&mut next_height, Some(5), &stop)
        .unwrap_err();

    assert!(matches!(err, RunloopError::MissingBlock(3)));
    assert_eq!(next_height, 3);
    assert_eq!(state.commits, vec![1, 2]);
}

#[test]
fn output_header_mismatch_is_fatal() {
    let (chain, ledger, pool) = (genesis_chain(), empty_chain(3), pool());
    let mut state = MockState { corrupt_at: Some(2), ..MockState::with_genesis() };
    let executor = MockExecutor::default();
    let stop = AtomicUsize::new(0);

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool);
    let mut next_height = 1;
    let err = Runloop::new(processor, &ledger, &pool)
        .run(&mut next_height, Some(3), &stop)
        .unwrap_err();

    assert!(matches!(
        err,
        RunloopError::Block {
            height: 2,
            source: BlockError::Validation(ValidationError::OutputHeaderMismatch {
                field: "state_root",
                ..
            })
        }
    ));
    assert_eq!(state.finalized, vec![1]);
}

#[test]
fn parent_hash_is_taken_from_the_store() {
    let (chain, ledger, pool) = (genesis_chain(), empty_chain(2), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());
    let stop = AtomicUsize::new(0);

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool);
    let mut next_height = 1;
    Runloop::new(processor, &ledger, &pool).run(&mut next_height, Some(2), &stop).unwrap();

    assert_eq!(state.headers[&1].parent_hash, state.headers[&0].hash_slow());
    assert_eq!(state.headers[&2].parent_hash, state.headers[&1].hash_slow());
}

#[test]
fn bootstrap_recovers_two_preceding_blocks() {
    let (a, b) = (SigningKey::random(&mut OsRng), SigningKey::random(&mut OsRng));
    let ledger: MemoryBlockStore = [
        block(1, vec![signed(&a, 0)], false),
        block(2, vec![signed(&b, 0), unsigned()], false),
        block(3, Vec::new(), false),
    ]
    .into_iter()
    .collect();
    let (chain, pool) = (genesis_chain(), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool);
    let runloop = Runloop::new(processor, &ledger, &pool);

    let window = runloop.bootstrap(3).unwrap();
    assert_eq!(window.generations(), 2);
    let (current, parent) = (window.current().unwrap(), window.parent().unwrap());
    assert!(current.contains(&address_of(&b)));
    assert_eq!(current.len(), 1);
    assert!(parent.contains(&address_of(&a)));
    assert!(window.grandparent().is_none());

    assert_eq!(runloop.bootstrap(1).unwrap().generations(), 0);
    assert_eq!(runloop.bootstrap(2).unwrap().generations(), 1);
    assert!(matches!(runloop.bootstrap(5), Err(RunloopError::MissingBlock(4))));
}

#[test]
fn revert_hook_sees_recent_activity() {
    let (a, b) = (SigningKey::random(&mut OsRng), SigningKey::random(&mut OsRng));
    let ledger: MemoryBlockStore = [
        block(1, vec![signed(&a, 0)], true),
        block(2, vec![signed(&a, 1), signed(&b, 0), signed(&b, 1)], true),
    ]
    .into_iter()
    .collect();
    let (chain, pool) = (StrataChain::new(ChainSpec::new(1)), pool());
    let (mut state, executor) = (MockState::with_genesis(), MockExecutor::default());
    let stop = AtomicUsize::new(0);

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool);
    let mut next_height = 1;
    let summary =
        Runloop::new(processor, &ledger, &pool).run(&mut next_height, Some(2), &stop).unwrap();

    assert_eq!(summary.transactions, 4);
    assert_eq!(summary.gas, 21_000 * 4);
    // a is active in block 1; b's second transaction is not its first in block 2.
    assert_eq!(*executor.reverts.lock(), vec![false, true, false, true]);
}

#[test]
fn events_and_retries_are_published() {
    let key = SigningKey::random(&mut OsRng);
    let ledger: MemoryBlockStore =
        [block(1, vec![signed(&key, 0), signed(&key, 1)], false)].into_iter().collect();
    let (chain, pool) = (genesis_chain(), pool());
    let mut state = MockState::with_genesis();
    let executor = MockExecutor { conflict_once: true, ..Default::default() };
    let sink = RecordingSink::default();
    let stop = AtomicUsize::new(0);

    let processor = BlockProcessor::new(&chain, &mut state, &executor, &pool).with_sink(&sink);
    let mut next_height = 1;
    Runloop::new(processor, &ledger, &pool).run(&mut next_height, Some(1), &stop).unwrap();

    let events = sink.events.lock();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ExecEvent::BlockStart { number: 1, timestamp: 1, tx_count: 2 });
    let ExecEvent::BlockFinalized { number, hash, gas_used, tx_count, retries, .. } = &events[1]
    else {
        panic!("expected a finalized event, got {:?}", events[1]);
    };
    assert_eq!((*number, *gas_used, *tx_count, *retries), (1, 42_000, 2, 2));
    assert_eq!(*hash, state.headers[&1].hash_slow());
}
