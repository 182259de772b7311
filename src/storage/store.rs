//! Block storage contract and the in-memory backend
//!
//! Blocks are stored by the hex-encoded block hash. Every backend keeps
//! the canonical encoding, so a stored block reads back byte-identical.

use crate::core::codec::{CodecError, Decode, Encode};
use crate::core::Block;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Stored block is malformed: {0}")]
    Codec(#[from] CodecError),
    #[error("Block {0} not found")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Persistence capability consumed by the ledger
pub trait Storage: Send + Sync {
    /// Persist a block under its hash
    fn put(&self, block: &Block) -> Result<(), StorageError>;

    /// Load the block stored under `hash_hex`
    fn get(&self, hash_hex: &str) -> Result<Block, StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn put(&self, block: &Block) -> Result<(), StorageError> {
        (**self).put(block)
    }

    fn get(&self, hash_hex: &str) -> Result<Block, StorageError> {
        (**self).get(hash_hex)
    }
}

/// Volatile store holding encoded blocks in a map
#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

impl Storage for MemoryStore {
    fn put(&self, block: &Block) -> Result<(), StorageError> {
        let key = block.calculate_hash().to_hex();
        self.blocks.write().insert(key, block.encode());
        Ok(())
    }

    fn get(&self, hash_hex: &str) -> Result<Block, StorageError> {
        let blocks = self.blocks.read();
        let bytes = blocks
            .get(hash_hex)
            .ok_or_else(|| StorageError::NotFound(hash_hex.to_string()))?;
        Ok(Block::decode(bytes)?)
    }
}
