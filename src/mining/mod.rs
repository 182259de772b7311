//! Pending transaction pooling

pub mod mempool;

pub use mempool::{Mempool, MempoolError};
