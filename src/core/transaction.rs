//! Transaction handling for the ledger
//!
//! A transaction moves `value` from one public key to another, carries an
//! opaque `data` payload and a sender-chosen `nonce`. It is identified by
//! the SHA-256 of its canonical payload encoding and authorised by an
//! Ed25519 signature over that hash.

use crate::core::codec::encode_transaction_payload;
use crate::crypto::{sha256, Hash, PrivateKey, PublicKey, Signature};
use thiserror::Error;

/// Transaction-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Transaction is not signed")]
    MissingSignature,
    #[error("Invalid transaction signature")]
    InvalidSignature,
}

/// A value transfer between two public keys
///
/// Fields are private so that every mutation goes through a method that
/// drops the cached hash.
#[derive(Debug, Clone)]
pub struct Transaction {
    from: PublicKey,
    to: PublicKey,
    value: u64,
    data: Vec<u8>,
    nonce: i64,
    signature: Option<Signature>,
    hash: Option<Hash>,
}

impl Transaction {
    /// Create an unsigned transaction. The sender is filled in by [`sign`](Self::sign).
    pub fn new(to: PublicKey, value: u64, data: Vec<u8>, nonce: i64) -> Self {
        Self {
            from: PublicKey::default(),
            to,
            value,
            data,
            nonce,
            signature: None,
            hash: None,
        }
    }

    /// Set the sender explicitly, for transactions signed elsewhere
    pub fn with_from(mut self, from: PublicKey) -> Self {
        self.from = from;
        self.hash = None;
        self
    }

    pub(crate) fn from_parts(
        from: PublicKey,
        to: PublicKey,
        value: u64,
        data: Vec<u8>,
        nonce: i64,
        signature: Option<Signature>,
    ) -> Self {
        Self {
            from,
            to,
            value,
            data,
            nonce,
            signature,
            hash: None,
        }
    }

    pub fn from(&self) -> &PublicKey {
        &self.from
    }

    pub fn to(&self) -> &PublicKey {
        &self.to
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn nonce(&self) -> i64 {
        self.nonce
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn set_to(&mut self, to: PublicKey) {
        self.to = to;
        self.hash = None;
    }

    pub fn set_value(&mut self, value: u64) {
        self.value = value;
        self.hash = None;
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.hash = None;
    }

    pub fn set_nonce(&mut self, nonce: i64) {
        self.nonce = nonce;
        self.hash = None;
    }

    /// Compute the transaction hash from the current fields.
    ///
    /// The signature is not part of the pre-image.
    pub fn calculate_hash(&self) -> Hash {
        sha256(&encode_transaction_payload(self))
    }

    /// The transaction hash, memoized until the next mutation
    pub fn hash(&mut self) -> Hash {
        match self.hash {
            Some(hash) => hash,
            None => {
                let hash = self.calculate_hash();
                self.hash = Some(hash);
                hash
            }
        }
    }

    /// Hex-encoded hash, as used for mempool keys
    pub fn hash_hex(&self) -> String {
        self.hash.unwrap_or_else(|| self.calculate_hash()).to_hex()
    }

    /// Sign the transaction: sets the sender to the key's public key,
    /// hashes the payload and signs the hash bytes.
    pub fn sign(&mut self, private_key: &PrivateKey) {
        self.from = private_key.public_key();
        self.hash = None;
        let hash = self.hash();
        self.signature = Some(private_key.sign(hash.as_bytes()));
    }

    /// Verify the signature against the sender key.
    ///
    /// The hash is always recomputed so a stale cache can never mask
    /// tampering, and nothing is mutated.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let signature = self.signature.as_ref().ok_or(TransactionError::MissingSignature)?;
        let hash = self.calculate_hash();
        if self.from.verify(hash.as_bytes(), signature) {
            Ok(())
        } else {
            Err(TransactionError::InvalidSignature)
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.value == other.value
            && self.data == other.data
            && self.nonce == other.nonce
            && self.signature == other.signature
    }
}

impl Eq for Transaction {}
