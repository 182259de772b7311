//! Ledger Core: the verification-and-ledger core of a minimal blockchain
//!
//! This crate provides:
//! - Ed25519 keys derived from mnemonic phrases, with 20-byte addresses
//! - A single versioned binary codec used for hashing, signing and storage
//! - Signed transactions and blocks with full verification
//! - A header chain guarded by strict append validation
//! - A thread-safe, deduplicating transaction pool
//! - Pluggable block storage (in-memory or one file per block)
//!
//! # Example
//!
//! ```rust
//! use ledger_core::config::ChainConfig;
//! use ledger_core::core::{Blockchain, Transaction};
//! use ledger_core::crypto::PrivateKey;
//! use ledger_core::mining::Mempool;
//! use ledger_core::storage::MemoryStore;
//!
//! let config = ChainConfig::default();
//! let mut chain = Blockchain::new(MemoryStore::new(), &config).unwrap();
//! let mempool = Mempool::new();
//!
//! let alice = PrivateKey::from_mnemonic("alice's phrase");
//! let bob = PrivateKey::from_mnemonic("bob's phrase").public_key();
//!
//! let mut tx = Transaction::new(bob, 10, b"coffee".to_vec(), 0);
//! tx.sign(&alice);
//! mempool.add(tx).unwrap();
//!
//! let mut block = chain.next_block(mempool.transactions()).unwrap();
//! block.sign(&alice);
//! chain.accept_block(&block, &mempool).unwrap();
//!
//! assert_eq!(chain.height(), Some(1));
//! assert!(mempool.is_empty());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod storage;

// Re-export commonly used types
pub use config::{ChainConfig, MempoolPolicy};
pub use core::{Block, Blockchain, ChainError, Header, HeaderChain, Transaction};
pub use crypto::{Address, Hash, PrivateKey, PublicKey, Signature};
pub use mining::Mempool;
pub use storage::{FileStore, MemoryStore, Storage};
