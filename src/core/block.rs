//! Block implementation for the ledger
//!
//! A block is a header plus an ordered list of transactions, sealed by the
//! author's signature over the canonical header encoding. The block hash
//! is the SHA-256 of that same header encoding.

use crate::core::codec::Encode;
use crate::core::transaction::{Transaction, TransactionError};
use crate::crypto::{sha256, sha256_concat, Hash, PrivateKey, PublicKey, Signature};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current block header version
pub const BLOCK_VERSION: u32 = 1;

// =============================================================================
// Block Errors
// =============================================================================

/// Block verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("Block is not signed")]
    MissingSignature,
    #[error("Invalid block signature")]
    InvalidBlockSignature,
    #[error("Invalid transaction at index {index}: {source}")]
    InvalidTransaction {
        index: usize,
        source: TransactionError,
    },
    #[error("Transaction hash mismatch: header has {expected}, transactions hash to {actual}")]
    TxHashMismatch { expected: Hash, actual: Hash },
}

/// SHA-256 over the concatenated transaction hashes, in list order
pub fn aggregate_hash(transactions: &[Transaction]) -> Hash {
    sha256_concat(transactions.iter().map(|tx| tx.calculate_hash()))
}

/// Nanoseconds since the Unix epoch. Instants outside the `i64` range
/// (before 1677 or after 2262) saturate to `i64::MIN` / `i64::MAX` so the
/// ordering of timestamps is preserved.
pub fn timestamp_nanos(at: DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt()
        .unwrap_or(if at.timestamp() < 0 { i64::MIN } else { i64::MAX })
}

// =============================================================================
// Header
// =============================================================================

/// Block header containing metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Hash of the previous block (all zeros for genesis)
    pub prev_block_hash: Hash,
    /// Aggregate hash of the block's transactions
    pub tx_hash: Hash,
    pub version: u32,
    pub height: u64,
    /// Creation time in nanoseconds since the Unix epoch
    pub timestamp: i64,
    pub nonce: u64,
    pub difficulty: u8,
}

impl Header {
    /// Create a header for an empty block, timestamped now
    pub fn new(prev_block_hash: Hash, height: u64, version: u32) -> Self {
        Self {
            prev_block_hash,
            tx_hash: aggregate_hash(&[]),
            version,
            height,
            timestamp: timestamp_nanos(Utc::now()),
            nonce: 0,
            difficulty: 0,
        }
    }

    /// SHA-256 of the canonical header encoding
    pub fn hash(&self) -> Hash {
        sha256(&self.encode())
    }
}

// =============================================================================
// Block
// =============================================================================

/// A block of transactions
#[derive(Debug, Clone)]
pub struct Block {
    header: Header,
    transactions: Vec<Transaction>,
    public_key: Option<PublicKey>,
    signature: Option<Signature>,
    hash: Option<Hash>,
}

impl Block {
    /// Assemble a block. Nothing is validated here.
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
            public_key: None,
            signature: None,
            hash: None,
        }
    }

    /// Create the successor of `prev` holding `transactions`
    pub fn new_from_prev_header(prev: &Header, transactions: Vec<Transaction>) -> Self {
        let mut header = Header::new(prev.hash(), prev.height + 1, prev.version);
        header.tx_hash = aggregate_hash(&transactions);
        Self::new(header, transactions)
    }

    pub(crate) fn from_parts(
        header: Header,
        transactions: Vec<Transaction>,
        seal: Option<(PublicKey, Signature)>,
    ) -> Self {
        let (public_key, signature) = match seal {
            Some((public_key, signature)) => (Some(public_key), Some(signature)),
            None => (None, None),
        };
        Self {
            header,
            transactions,
            public_key,
            signature,
            hash: None,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Mutable header access. Drops the cached hash; an existing signature
    /// no longer verifies after any change.
    pub fn header_mut(&mut self) -> &mut Header {
        self.hash = None;
        &mut self.header
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Mutable transaction access. The header's `tx_hash` is left as is.
    pub fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        &mut self.transactions
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Append a transaction and recompute the header's aggregate hash
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
        self.header.tx_hash = aggregate_hash(&self.transactions);
        self.hash = None;
    }

    /// Sign the canonical header encoding
    pub fn sign(&mut self, private_key: &PrivateKey) {
        self.signature = Some(private_key.sign(&self.header.encode()));
        self.public_key = Some(private_key.public_key());
    }

    /// Full verification: author signature, then every transaction, then
    /// the aggregate hash. The first failure is returned.
    pub fn verify(&self) -> Result<(), BlockError> {
        let (public_key, signature) = match (&self.public_key, &self.signature) {
            (Some(public_key), Some(signature)) => (public_key, signature),
            _ => return Err(BlockError::MissingSignature),
        };

        if !public_key.verify(&self.header.encode(), signature) {
            return Err(BlockError::InvalidBlockSignature);
        }

        for (index, tx) in self.transactions.iter().enumerate() {
            tx.verify()
                .map_err(|source| BlockError::InvalidTransaction { index, source })?;
        }

        let actual = aggregate_hash(&self.transactions);
        if actual != self.header.tx_hash {
            return Err(BlockError::TxHashMismatch {
                expected: self.header.tx_hash,
                actual,
            });
        }

        Ok(())
    }

    /// Compute the block hash from the current header
    pub fn calculate_hash(&self) -> Hash {
        self.header.hash()
    }

    /// The block hash, memoized until the header changes
    pub fn hash(&mut self) -> Hash {
        match self.hash {
            Some(hash) => hash,
            None => {
                let hash = self.calculate_hash();
                self.hash = Some(hash);
                hash
            }
        }
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.transactions == other.transactions
            && self.public_key == other.public_key
            && self.signature == other.signature
    }
}

impl Eq for Block {}
