//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing
//! - Ed25519 key management and address derivation
//! - BIP-39 mnemonic helpers

/// Hex string (de)serialization for fixed-size byte newtypes that
/// implement `Display` and `FromStr`.
#[macro_export]
#[doc(hidden)]
macro_rules! impl_hex_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod hash;
pub mod keys;
pub mod mnemonic;

pub use hash::{sha256, sha256_concat, sha256_hex, Hash, HASH_SIZE};
pub use keys::{
    derive_seed, Address, KeyError, PrivateKey, PublicKey, Signature, ADDRESS_SIZE,
    PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, SEED_SIZE, SIGNATURE_SIZE,
};
pub use mnemonic::{generate_mnemonic, mnemonic_from_entropy, validate_mnemonic};
