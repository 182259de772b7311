//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Canonical binary codec (hashing, signing and storage input)
//! - Transactions (signed value transfers)
//! - Blocks (signed headers over an ordered transaction list)
//! - Header chain (accepted headers by height)
//! - Blockchain (the append/validate gate in front of storage)

pub mod block;
pub mod blockchain;
pub mod codec;
pub mod header_chain;
pub mod transaction;

pub use block::{aggregate_hash, timestamp_nanos, Block, BlockError, Header, BLOCK_VERSION};
pub use blockchain::{genesis_block, Blockchain, ChainError, ChainState};
pub use codec::{encode_transaction_payload, CodecError, Decode, Encode, CODEC_VERSION};
pub use header_chain::{HeaderChain, IndexOutOfRange};
pub use transaction::{Transaction, TransactionError};
