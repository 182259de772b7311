//! Transaction pool (mempool) for pending transactions
//!
//! Holds transactions waiting to be included in a block, keyed by the
//! hex-encoded transaction hash. The pool is safe to share between
//! threads: reads take the shared lock, writes the exclusive one.
//! Only correctly signed transactions are admitted. The hash does not
//! cover the signature, so an unsigned copy would otherwise occupy the
//! slot of the real transaction.

use crate::core::{Block, Transaction, TransactionError};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;

/// Mempool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MempoolError {
    #[error("Transaction {0} already in mempool")]
    DuplicateTransaction(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(#[from] TransactionError),
}

/// Pool of pending transactions
#[derive(Debug, Default)]
pub struct Mempool {
    transactions: RwLock<HashMap<String, Transaction>>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a transaction with the same hash is pooled
    pub fn has(&self, tx: &Transaction) -> bool {
        self.transactions.read().contains_key(&tx.hash_hex())
    }

    /// Insert a signed transaction. The duplicate check and the insert
    /// happen under one write lock.
    pub fn add(&self, tx: Transaction) -> Result<(), MempoolError> {
        tx.verify()?;
        let key = tx.hash_hex();
        let mut pool = self.transactions.write();
        match pool.entry(key) {
            Entry::Occupied(entry) => Err(MempoolError::DuplicateTransaction(entry.key().clone())),
            Entry::Vacant(entry) => {
                log::debug!("Added transaction {} to mempool", entry.key());
                entry.insert(tx);
                Ok(())
            }
        }
    }

    pub fn get(&self, hash_hex: &str) -> Option<Transaction> {
        self.transactions.read().get(hash_hex).cloned()
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }

    /// Drop every pooled transaction
    pub fn flush(&self) {
        let mut pool = self.transactions.write();
        let dropped = pool.len();
        pool.clear();
        log::info!("Flushed {} transactions from mempool", dropped);
    }

    /// Drop the transactions included in `block`; returns how many were removed
    pub fn remove_included(&self, block: &Block) -> usize {
        let mut pool = self.transactions.write();
        let removed = block
            .transactions()
            .iter()
            .filter(|tx| pool.remove(&tx.hash_hex()).is_some())
            .count();
        log::debug!(
            "Removed {} included transactions from mempool, {} remain",
            removed,
            pool.len()
        );
        removed
    }

    /// Snapshot of the pooled transactions, in no particular order
    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Header, BLOCK_VERSION};
    use crate::crypto::{Hash, PrivateKey, PublicKey};

    fn tx(nonce: i64) -> Transaction {
        let mut tx = Transaction::new(PublicKey([8; 32]), 10, vec![], nonce);
        tx.sign(&PrivateKey::from_mnemonic("mempool test key"));
        tx
    }

    #[test]
    fn test_mempool_add_and_has() {
        let mempool = Mempool::new();
        assert!(mempool.is_empty());

        let t = tx(1);
        assert!(!mempool.has(&t));
        mempool.add(t.clone()).unwrap();
        assert!(mempool.has(&t));
        assert_eq!(mempool.len(), 1);
        assert_eq!(mempool.get(&t.hash_hex()), Some(t));
    }

    #[test]
    fn test_mempool_duplicate() {
        let mempool = Mempool::new();
        let t = tx(1);
        mempool.add(t.clone()).unwrap();
        assert_eq!(
            mempool.add(t.clone()),
            Err(MempoolError::DuplicateTransaction(t.hash_hex()))
        );
        assert_eq!(mempool.len(), 1);
    }

    #[test]
    fn test_mempool_rejects_unverifiable_copies() {
        let mempool = Mempool::new();
        let genuine = tx(1);

        let unsigned = Transaction::new(*genuine.to(), genuine.value(), genuine.data().to_vec(), 1)
            .with_from(*genuine.from());
        assert_eq!(unsigned.hash_hex(), genuine.hash_hex());
        assert_eq!(
            mempool.add(unsigned),
            Err(MempoolError::InvalidTransaction(TransactionError::MissingSignature))
        );

        let mut tampered = genuine.clone();
        tampered.set_value(genuine.value() + 1);
        assert_eq!(
            mempool.add(tampered),
            Err(MempoolError::InvalidTransaction(TransactionError::InvalidSignature))
        );

        assert!(mempool.is_empty());
        mempool.add(genuine.clone()).unwrap();
        assert!(mempool.has(&genuine));
    }

    #[test]
    fn test_mempool_flush() {
        let mempool = Mempool::new();
        for nonce in 0..5 {
            mempool.add(tx(nonce)).unwrap();
        }
        assert_eq!(mempool.len(), 5);
        mempool.flush();
        assert_eq!(mempool.len(), 0);
        assert!(mempool.transactions().is_empty());
    }

    #[test]
    fn test_mempool_remove_included() {
        let mempool = Mempool::new();
        for nonce in 0..4 {
            mempool.add(tx(nonce)).unwrap();
        }
        let block = Block::new(Header::new(Hash::ZERO, 1, BLOCK_VERSION), vec![tx(0), tx(2), tx(9)]);
        assert_eq!(mempool.remove_included(&block), 2);
        assert_eq!(mempool.len(), 2);
        assert!(mempool.has(&tx(1)));
        assert!(!mempool.has(&tx(2)));
    }

    #[test]
    fn test_mempool_concurrent_adds() {
        let mempool = Mempool::new();
        let pending: Vec<Transaction> = (0..64).map(tx).collect();

        // Every thread tries to add every transaction; exactly one add per
        // transaction may succeed.
        let successes: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        pending
                            .iter()
                            .filter(|t| mempool.add((*t).clone()).is_ok())
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(successes, pending.len());
        assert_eq!(mempool.len(), pending.len());
    }
}
