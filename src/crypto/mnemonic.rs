//! BIP-39 mnemonic phrases
//!
//! Key derivation itself only needs the phrase string (see
//! [`derive_seed`](super::keys::derive_seed)); this module covers creating
//! and checking phrases for operators.

use bip39::Mnemonic;
use rand::rngs::OsRng;
use rand::RngCore;

use super::keys::KeyError;

/// Entropy size for a 12-word phrase (128 bits)
pub const MNEMONIC_ENTROPY_SIZE: usize = 16;

/// Build the English mnemonic for the given entropy
pub fn mnemonic_from_entropy(entropy: &[u8]) -> Result<String, KeyError> {
    Mnemonic::from_entropy(entropy)
        .map(|m| m.to_string())
        .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))
}

/// Generate a fresh 12-word mnemonic from secure randomness
pub fn generate_mnemonic() -> Result<String, KeyError> {
    let mut entropy = [0u8; MNEMONIC_ENTROPY_SIZE];
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| KeyError::EntropyUnavailable(e.to_string()))?;
    mnemonic_from_entropy(&entropy)
}

/// Check that a phrase is a well-formed English mnemonic with a valid checksum
pub fn validate_mnemonic(phrase: &str) -> Result<(), KeyError> {
    Mnemonic::parse_normalized(phrase)
        .map(|_| ())
        .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))
}
