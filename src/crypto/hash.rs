//! Cryptographic hashing utilities for the ledger
//!
//! Provides the 32-byte [`Hash`] value used for block hashes,
//! transaction hashes and the aggregate transaction hash.

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use super::keys::KeyError;

/// Size of a hash in bytes
pub const HASH_SIZE: usize = 32;

/// A SHA-256 digest
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; HASH_SIZE]);

impl Hash {
    /// The all-zero hash, used as the genesis previous-block hash
    pub const ZERO: Hash = Hash([0u8; HASH_SIZE]);

    /// Build a hash from a byte slice of exactly [`HASH_SIZE`] bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| KeyError::InvalidHashLength {
            expected: HASH_SIZE,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Returns true if every byte is zero
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

crate::impl_hex_serde!(Hash);

/// Computes the SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Hash {
    Hash(Sha256::digest(data).into())
}

/// Computes SHA-256 over several byte slices, as if they were concatenated
pub fn sha256_concat<I, B>(parts: I) -> Hash
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    Hash(hasher.finalize().into())
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    sha256(data).to_hex()
}
