//! Blockchain implementation
//!
//! Owns the header chain and the block store and gates every append.
//! A candidate block must, in order: sit above the current height, sit
//! exactly one above it, verify in full, and link to the current tip.
//! Accepted blocks are persisted before their header is appended, so a
//! rejected or failed append leaves the chain untouched.
//!
//! `Blockchain` is single-writer; share it behind a lock if needed.

use crate::config::{ChainConfig, MempoolPolicy};
use crate::core::block::{aggregate_hash, Block, BlockError, Header};
use crate::core::header_chain::{HeaderChain, IndexOutOfRange};
use crate::core::transaction::Transaction;
use crate::crypto::{Hash, PublicKey};
use crate::mining::Mempool;
use crate::storage::{Storage, StorageError};
use thiserror::Error;

/// Blockchain-related errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Chain has no genesis block")]
    Uninitialized,
    #[error("Chain already has a genesis block")]
    AlreadyInitialized,
    #[error("Invalid genesis block: {0}")]
    InvalidGenesis(String),
    #[error("Duplicate height: block at height {height} but chain is already at {current}")]
    DuplicateHeight { height: u64, current: u64 },
    #[error("Height gap: block at height {height}, expected {expected}")]
    HeightGap { height: u64, expected: u64 },
    #[error("Invalid block: {0}")]
    InvalidBlock(#[from] BlockError),
    #[error("Previous hash mismatch: tip is {expected}, block links to {actual}")]
    PrevHashMismatch { expected: Hash, actual: Hash },
    #[error(transparent)]
    IndexOutOfRange(#[from] IndexOutOfRange),
    #[error("Block not found: {0}")]
    BlockNotFound(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Lifecycle of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// No genesis yet
    Empty,
    /// Genesis only
    Initialized,
    /// At least one block on top of genesis
    Growing,
}

/// Build the genesis block for `config`: height 0, zero previous hash,
/// no transactions, signed by the configured chain key.
pub fn genesis_block(config: &ChainConfig) -> Block {
    let header = Header {
        prev_block_hash: Hash::ZERO,
        tx_hash: aggregate_hash(&[]),
        version: config.block_version,
        height: 0,
        timestamp: config.genesis_timestamp,
        nonce: 0,
        difficulty: 0,
    };
    let mut block = Block::new(header, vec![]);
    block.sign(&config.genesis_key());
    block
}

/// The ledger: accepted headers plus the store holding full blocks
pub struct Blockchain<S: Storage> {
    headers: HeaderChain,
    store: S,
    mempool_policy: MempoolPolicy,
    genesis_key: PublicKey,
}

impl<S: Storage> Blockchain<S> {
    /// Create a chain and insert the genesis block derived from `config`
    pub fn new(store: S, config: &ChainConfig) -> Result<Self, ChainError> {
        let mut chain = Self::empty(store, config);
        chain.init_genesis(&genesis_block(config))?;
        Ok(chain)
    }

    /// Create a chain with no genesis block
    pub fn empty(store: S, config: &ChainConfig) -> Self {
        Self {
            headers: HeaderChain::new(),
            store,
            mempool_policy: config.mempool_policy,
            genesis_key: config.genesis_key().public_key(),
        }
    }

    /// Insert a genesis block. It has no predecessor, so instead of the
    /// append checks it must be height 0, link to the zero hash, carry no
    /// transactions and verify under the configured chain key.
    pub fn init_genesis(&mut self, genesis: &Block) -> Result<(), ChainError> {
        if !self.headers.is_empty() {
            return Err(ChainError::AlreadyInitialized);
        }
        if let Err(e) = self.validate_genesis(genesis) {
            log::warn!("Rejected genesis block: {}", e);
            return Err(e);
        }
        self.store.put(genesis)?;
        self.headers.add(genesis.header().clone());
        log::info!("Created genesis block {}", genesis.calculate_hash());
        Ok(())
    }

    pub fn state(&self) -> ChainState {
        match self.headers.height() {
            None => ChainState::Empty,
            Some(0) => ChainState::Initialized,
            Some(_) => ChainState::Growing,
        }
    }

    /// Height of the tip, `None` before genesis
    pub fn height(&self) -> Option<u64> {
        self.headers.height()
    }

    pub fn headers(&self) -> &HeaderChain {
        &self.headers
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns true if a block at `height` has been accepted
    pub fn has_block(&self, height: u64) -> bool {
        self.headers.height().map_or(false, |current| height <= current)
    }

    pub fn header_by_height(&self, height: u64) -> Result<&Header, ChainError> {
        Ok(self.headers.get(height)?)
    }

    pub fn last_header(&self) -> Result<&Header, ChainError> {
        Ok(self.headers.last()?)
    }

    pub fn block_by_hash(&self, hash_hex: &str) -> Result<Block, ChainError> {
        self.store.get(hash_hex).map_err(|e| match e {
            StorageError::NotFound(hash) => ChainError::BlockNotFound(hash),
            other => ChainError::Storage(other),
        })
    }

    pub fn block_by_height(&self, height: u64) -> Result<Block, ChainError> {
        let hash = self.header_by_height(height)?.hash();
        self.block_by_hash(&hash.to_hex())
    }

    /// Unsigned successor of the current tip holding `transactions`
    pub fn next_block(&self, transactions: Vec<Transaction>) -> Result<Block, ChainError> {
        Ok(Block::new_from_prev_header(self.last_header()?, transactions))
    }

    /// Validate and append a block, returning its hash.
    ///
    /// The first failing check aborts the append with nothing changed.
    pub fn add_block(&mut self, block: &Block) -> Result<Hash, ChainError> {
        if let Err(e) = self.validate_block(block) {
            log::warn!("Rejected block at height {}: {}", block.height(), e);
            return Err(e);
        }

        self.store.put(block)?;
        self.headers.add(block.header().clone());

        let hash = block.calculate_hash();
        log::info!("Accepted block {} at height {}", hash, block.height());
        Ok(hash)
    }

    /// Append a block, then prune the mempool per the configured policy
    pub fn accept_block(&mut self, block: &Block, mempool: &Mempool) -> Result<Hash, ChainError> {
        let hash = self.add_block(block)?;
        match self.mempool_policy {
            MempoolPolicy::RemoveIncluded => {
                mempool.remove_included(block);
            }
            MempoolPolicy::FlushAll => mempool.flush(),
        }
        Ok(hash)
    }

    fn validate_genesis(&self, genesis: &Block) -> Result<(), ChainError> {
        let header = genesis.header();
        if header.height != 0 {
            return Err(ChainError::InvalidGenesis(format!("height {}", header.height)));
        }
        if !header.prev_block_hash.is_zero() {
            return Err(ChainError::InvalidGenesis(format!(
                "previous hash {}",
                header.prev_block_hash
            )));
        }
        if !genesis.transactions().is_empty() {
            return Err(ChainError::InvalidGenesis(format!(
                "{} transactions",
                genesis.transactions().len()
            )));
        }
        genesis.verify()?;
        if genesis.public_key() != Some(&self.genesis_key) {
            return Err(ChainError::InvalidGenesis("not signed by the chain key".to_string()));
        }
        Ok(())
    }

    fn validate_block(&self, block: &Block) -> Result<(), ChainError> {
        let current = self.headers.height().ok_or(ChainError::Uninitialized)?;
        let height = block.height();

        if height <= current {
            return Err(ChainError::DuplicateHeight { height, current });
        }
        if height != current + 1 {
            return Err(ChainError::HeightGap {
                height,
                expected: current + 1,
            });
        }

        block.verify()?;

        let expected = self.headers.last()?.hash();
        let actual = block.header().prev_block_hash;
        if expected != actual {
            return Err(ChainError::PrevHashMismatch { expected, actual });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{PrivateKey, PublicKey};
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn key() -> PrivateKey {
        PrivateKey::from_mnemonic("block author")
    }

    fn chain() -> Blockchain<MemoryStore> {
        Blockchain::new(MemoryStore::new(), &ChainConfig::default()).unwrap()
    }

    fn signed_tx(nonce: i64) -> Transaction {
        let mut tx = Transaction::new(PublicKey([6; 32]), 25, vec![], nonce);
        tx.sign(&key());
        tx
    }

    fn next_signed<S: Storage>(chain: &Blockchain<S>, transactions: Vec<Transaction>) -> Block {
        let mut block = chain.next_block(transactions).unwrap();
        block.sign(&key());
        block
    }

    #[test]
    fn test_genesis_block() {
        let config = ChainConfig::default();
        let genesis = genesis_block(&config);
        assert_eq!(genesis.height(), 0);
        assert!(genesis.header().prev_block_hash.is_zero());
        assert!(genesis.transactions().is_empty());
        assert_eq!(genesis.public_key(), Some(&config.genesis_key().public_key()));
        assert!(genesis.verify().is_ok());
        // deterministic across constructions
        assert_eq!(genesis.calculate_hash(), genesis_block(&config).calculate_hash());
    }

    #[test]
    fn test_state_transitions() {
        let config = ChainConfig::default();
        let mut chain = Blockchain::empty(MemoryStore::new(), &config);
        assert_eq!(chain.state(), ChainState::Empty);
        assert_eq!(chain.height(), None);
        assert!(matches!(
            chain.add_block(&genesis_block(&config)),
            Err(ChainError::Uninitialized)
        ));

        chain.init_genesis(&genesis_block(&config)).unwrap();
        assert_eq!(chain.state(), ChainState::Initialized);
        assert!(matches!(
            chain.init_genesis(&genesis_block(&config)),
            Err(ChainError::AlreadyInitialized)
        ));

        let block = next_signed(&chain, vec![]);
        chain.add_block(&block).unwrap();
        assert_eq!(chain.state(), ChainState::Growing);
        assert_eq!(chain.height(), Some(1));
    }

    #[test]
    fn test_malformed_genesis_rejected() {
        let config = ChainConfig::default();
        let mut chain = Blockchain::empty(MemoryStore::new(), &config);

        let mut high = genesis_block(&config);
        high.header_mut().height = 5;
        high.header_mut().prev_block_hash = Hash([9; 32]);
        high.sign(&config.genesis_key());
        assert!(matches!(chain.init_genesis(&high), Err(ChainError::InvalidGenesis(_))));

        let mut linked = genesis_block(&config);
        linked.header_mut().prev_block_hash = Hash([9; 32]);
        linked.sign(&config.genesis_key());
        assert!(matches!(chain.init_genesis(&linked), Err(ChainError::InvalidGenesis(_))));

        let mut with_tx = genesis_block(&config);
        with_tx.add_transaction(signed_tx(0));
        with_tx.sign(&config.genesis_key());
        assert!(matches!(chain.init_genesis(&with_tx), Err(ChainError::InvalidGenesis(_))));

        let mut foreign = genesis_block(&config);
        foreign.sign(&key());
        assert!(matches!(chain.init_genesis(&foreign), Err(ChainError::InvalidGenesis(_))));

        let mut stale_signature = genesis_block(&config);
        stale_signature.header_mut().nonce = 1;
        assert!(matches!(
            chain.init_genesis(&stale_signature),
            Err(ChainError::InvalidBlock(BlockError::InvalidBlockSignature))
        ));

        // nothing was stored or appended, so a block at height 1 still has no base
        assert_eq!(chain.state(), ChainState::Empty);
        assert_eq!(chain.store().len(), 0);
        let orphan = Block::new(Header::new(Hash::ZERO, 1, config.block_version), vec![]);
        assert!(matches!(chain.add_block(&orphan), Err(ChainError::Uninitialized)));

        chain.init_genesis(&genesis_block(&config)).unwrap();
        assert_eq!(chain.last_header().unwrap().height, chain.height().unwrap());
    }

    #[test]
    fn test_add_valid_block() {
        let mut chain = chain();
        let block = next_signed(&chain, vec![signed_tx(0), signed_tx(1)]);
        let hash = chain.add_block(&block).unwrap();

        assert_eq!(hash, block.calculate_hash());
        assert!(chain.has_block(1));
        assert!(!chain.has_block(2));
        assert_eq!(chain.last_header().unwrap(), block.header());
        assert_eq!(chain.block_by_height(1).unwrap(), block);
        assert_eq!(chain.block_by_hash(&hash.to_hex()).unwrap(), block);
        assert_eq!(chain.block_by_height(0).unwrap().height(), 0);
    }

    #[test]
    fn test_duplicate_height_rejected() {
        let mut chain = chain();
        let block = next_signed(&chain, vec![]);
        chain.add_block(&block).unwrap();
        assert!(matches!(
            chain.add_block(&block),
            Err(ChainError::DuplicateHeight { height: 1, current: 1 })
        ));
    }

    #[test]
    fn test_height_gap_rejected() {
        let mut chain = chain();
        let mut block = chain.next_block(vec![]).unwrap();
        block.header_mut().height = 5;
        block.sign(&key());
        assert!(matches!(
            chain.add_block(&block),
            Err(ChainError::HeightGap { height: 5, expected: 1 })
        ));
        assert_eq!(chain.height(), Some(0));
    }

    #[test]
    fn test_invalid_block_rejected() {
        let mut chain = chain();

        let unsigned = chain.next_block(vec![]).unwrap();
        assert!(matches!(
            chain.add_block(&unsigned),
            Err(ChainError::InvalidBlock(BlockError::MissingSignature))
        ));

        let mut tampered = next_signed(&chain, vec![signed_tx(0)]);
        tampered.transactions_mut()[0].set_value(1_000_000);
        assert!(matches!(
            chain.add_block(&tampered),
            Err(ChainError::InvalidBlock(BlockError::InvalidTransaction { index: 0, .. }))
        ));
        assert_eq!(chain.height(), Some(0));
        assert_eq!(chain.store().len(), 1);
    }

    #[test]
    fn test_prev_hash_mismatch_rejected() {
        let mut chain = chain();
        let mut block = chain.next_block(vec![]).unwrap();
        block.header_mut().prev_block_hash = Hash([1; 32]);
        block.sign(&key());
        assert!(matches!(
            chain.add_block(&block),
            Err(ChainError::PrevHashMismatch { .. })
        ));
    }

    #[test]
    fn test_lookup_errors() {
        let chain = chain();
        assert!(matches!(
            chain.header_by_height(3),
            Err(ChainError::IndexOutOfRange(_))
        ));
        assert!(matches!(
            chain.block_by_hash(&Hash([2; 32]).to_hex()),
            Err(ChainError::BlockNotFound(_))
        ));
    }

    #[test]
    fn test_accept_block_removes_included_transactions() {
        let mut chain = chain();
        let mempool = Mempool::new();
        for nonce in 0..3 {
            mempool.add(signed_tx(nonce)).unwrap();
        }

        let block = next_signed(&chain, vec![signed_tx(0), signed_tx(1)]);
        chain.accept_block(&block, &mempool).unwrap();
        assert_eq!(mempool.len(), 1);
        assert!(mempool.has(&signed_tx(2)));
    }

    #[test]
    fn test_accept_block_flush_all_policy() {
        let config = ChainConfig {
            mempool_policy: MempoolPolicy::FlushAll,
            ..ChainConfig::default()
        };
        let mut chain = Blockchain::new(MemoryStore::new(), &config).unwrap();
        let mempool = Mempool::new();
        for nonce in 0..3 {
            mempool.add(signed_tx(nonce)).unwrap();
        }

        let block = next_signed(&chain, vec![signed_tx(0)]);
        chain.accept_block(&block, &mempool).unwrap();
        assert!(mempool.is_empty());
    }

    #[test]
    fn test_rejected_block_leaves_mempool_alone() {
        let mut chain = chain();
        let mempool = Mempool::new();
        mempool.add(signed_tx(0)).unwrap();
        let unsigned = chain.next_block(vec![signed_tx(0)]).unwrap();
        assert!(chain.accept_block(&unsigned, &mempool).is_err());
        assert_eq!(mempool.len(), 1);
    }

    /// Store whose writes can be switched off
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
        fail: AtomicBool,
    }

    impl Storage for FailingStore {
        fn put(&self, block: &Block) -> Result<(), StorageError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::InvalidData("disk full".to_string()));
            }
            self.inner.put(block)
        }

        fn get(&self, hash_hex: &str) -> Result<Block, StorageError> {
            self.inner.get(hash_hex)
        }
    }

    #[test]
    fn test_storage_failure_leaves_chain_unchanged() {
        let mut chain = Blockchain::new(FailingStore::default(), &ChainConfig::default()).unwrap();
        let block = next_signed(&chain, vec![signed_tx(0)]);

        chain.store().fail.store(true, Ordering::SeqCst);
        assert!(matches!(chain.add_block(&block), Err(ChainError::Storage(_))));
        assert_eq!(chain.height(), Some(0));
        assert_eq!(chain.state(), ChainState::Initialized);

        // the same block is accepted once storage recovers
        chain.store().fail.store(false, Ordering::SeqCst);
        chain.add_block(&block).unwrap();
        assert_eq!(chain.height(), Some(1));
    }

    #[test]
    fn test_configured_block_version_used() {
        let config = ChainConfig {
            block_version: 7,
            ..ChainConfig::default()
        };
        let chain = Blockchain::new(MemoryStore::new(), &config).unwrap();
        assert_eq!(chain.last_header().unwrap().version, 7);
        assert_eq!(chain.next_block(vec![]).unwrap().header().version, 7);
    }
}
