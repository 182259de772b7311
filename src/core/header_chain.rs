//! Append-only sequence of accepted block headers
//!
//! Index equals height. Ordering is the caller's responsibility; this
//! type performs no validation.

use crate::core::block::Header;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Header index {index} out of range (chain length {len})")]
pub struct IndexOutOfRange {
    pub index: u64,
    pub len: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HeaderChain {
    headers: Vec<Header>,
}

impl HeaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, header: Header) {
        self.headers.push(header);
    }

    /// Height of the last header, `None` while empty
    pub fn height(&self) -> Option<u64> {
        (self.headers.len() as u64).checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn get(&self, index: u64) -> Result<&Header, IndexOutOfRange> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.headers.get(i))
            .ok_or(IndexOutOfRange {
                index,
                len: self.headers.len(),
            })
    }

    /// The most recently added header
    pub fn last(&self) -> Result<&Header, IndexOutOfRange> {
        self.headers.last().ok_or(IndexOutOfRange { index: 0, len: 0 })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }
}
