//! Ed25519 key management for the ledger
//!
//! Provides seed derivation from mnemonic phrases, key generation,
//! address derivation, signing and verification.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Size of the expanded private key (seed followed by public key)
pub const PRIVATE_KEY_SIZE: usize = 64;

/// Size of an Ed25519 public key
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an Ed25519 signature
pub const SIGNATURE_SIZE: usize = 64;

/// Size of the seed a private key is derived from
pub const SEED_SIZE: usize = 32;

/// Size of an address (leading bytes of the public key)
pub const ADDRESS_SIZE: usize = 20;

/// Salt label mixed into the mnemonic stretching
pub const SEED_SALT: &[u8] = b"mnemonicSecret Passphrase";

/// PBKDF2 iteration count for seed derivation
pub const SEED_ITERATIONS: u32 = 1024;

/// Errors that can occur during key operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid seed length: expected {} bytes, got {0}", SEED_SIZE)]
    InvalidSeedLength(usize),
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("Invalid address length: expected {} bytes, got {0}", ADDRESS_SIZE)]
    InvalidAddressLength(usize),
    #[error("Invalid signature length: expected {} bytes, got {0}", SIGNATURE_SIZE)]
    InvalidSignatureLength(usize),
    #[error("Invalid hash length: expected {expected} bytes, got {got}")]
    InvalidHashLength { expected: usize, got: usize },
    #[error("Invalid private key: seed and public key halves do not match")]
    InvalidPrivateKey,
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),
}

/// Derive a 32-byte seed from a mnemonic phrase.
///
/// PBKDF2-HMAC-SHA512 over the raw phrase with [`SEED_SALT`] and
/// [`SEED_ITERATIONS`]. The phrase is not checked against a wordlist.
pub fn derive_seed(mnemonic: &str) -> [u8; SEED_SIZE] {
    let mut seed = [0u8; SEED_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha512>(mnemonic.as_bytes(), SEED_SALT, SEED_ITERATIONS, &mut seed);
    seed
}

// =============================================================================
// Private Key
// =============================================================================

/// An Ed25519 private key
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Create a private key from a 32-byte seed
    pub fn from_seed(seed: &[u8]) -> Result<Self, KeyError> {
        let seed: [u8; SEED_SIZE] = seed
            .try_into()
            .map_err(|_| KeyError::InvalidSeedLength(seed.len()))?;
        Ok(Self(SigningKey::from_bytes(&seed)))
    }

    /// Create a private key from a mnemonic phrase
    pub fn from_mnemonic(mnemonic: &str) -> Self {
        Self(SigningKey::from_bytes(&derive_seed(mnemonic)))
    }

    /// Create a private key from a hex-encoded 32-byte seed
    pub fn from_hex(seed_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(seed_hex).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        Self::from_seed(&bytes)
    }

    /// Restore a private key from its 64-byte expanded form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PRIVATE_KEY_SIZE] =
            bytes.try_into().map_err(|_| KeyError::InvalidKeyLength {
                expected: PRIVATE_KEY_SIZE,
                got: bytes.len(),
            })?;
        SigningKey::from_keypair_bytes(&bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidPrivateKey)
    }

    /// Generate a new private key from the operating system's secure randomness
    pub fn generate() -> Result<Self, KeyError> {
        let mut seed = [0u8; SEED_SIZE];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| KeyError::EntropyUnavailable(e.to_string()))?;
        Ok(Self(SigningKey::from_bytes(&seed)))
    }

    /// The 64-byte expanded key: the seed followed by the public key
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_keypair_bytes()
    }

    /// The public key, i.e. the trailing 32 bytes of the expanded key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().to_bytes())
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message).to_bytes())
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&"<redacted>").finish()
    }
}

// =============================================================================
// Public Key
// =============================================================================

/// An Ed25519 public key
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; PUBLIC_KEY_SIZE] =
            bytes.try_into().map_err(|_| KeyError::InvalidKeyLength {
                expected: PUBLIC_KEY_SIZE,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// The address: first [`ADDRESS_SIZE`] bytes of the key
    pub fn address(&self) -> Address {
        let mut out = [0u8; ADDRESS_SIZE];
        out.copy_from_slice(&self.0[..ADDRESS_SIZE]);
        Address(out)
    }

    /// Verify a signature over `message`.
    ///
    /// Never fails loudly: a key that is not a valid curve point simply
    /// does not verify anything.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        key.verify(message, &sig).is_ok()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

crate::impl_hex_serde!(PublicKey);

// =============================================================================
// Address
// =============================================================================

/// A printable account identity derived from a public key
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; ADDRESS_SIZE]);

impl Address {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; ADDRESS_SIZE] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidAddressLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

crate::impl_hex_serde!(Address);

// =============================================================================
// Signature
// =============================================================================

/// An Ed25519 signature
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_SIZE]);

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; SIGNATURE_SIZE] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Verify this signature over `message` with `public_key`
    pub fn verify(&self, public_key: &PublicKey, message: &[u8]) -> bool {
        public_key.verify(message, self)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

crate::impl_hex_serde!(Signature);
