//! Storage module for block persistence

pub mod persistence;
pub mod store;

pub use persistence::FileStore;
pub use store::{MemoryStore, Storage, StorageError};
