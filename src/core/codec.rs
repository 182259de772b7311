//! Canonical binary encoding
//!
//! The single encoding used for hashing, signing and persistence of
//! headers, transactions and blocks. Field order and widths below are
//! consensus-relevant: changing any of them changes every hash.
//!
//! Layout rules:
//! - every top-level encoding starts with [`CODEC_VERSION`]
//! - integers are fixed-width little-endian
//! - variable-length fields carry a `u64` length prefix
//! - optional signatures carry a one-byte presence flag (0 or 1)

use crate::core::block::{Block, Header};
use crate::core::transaction::Transaction;
use crate::crypto::{Hash, PublicKey, Signature};
use thiserror::Error;

/// Version byte prefixed to every top-level encoding
pub const CODEC_VERSION: u8 = 1;

/// Size of an encoded header including the version byte
pub const HEADER_ENCODED_SIZE: usize = 1 + 32 + 32 + 4 + 8 + 8 + 8 + 1;

/// Codec errors. Every variant is a malformed-encoding failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed encoding: truncated input (needed {needed} bytes, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },
    #[error("malformed encoding: {0} trailing bytes")]
    TrailingBytes(usize),
    #[error("malformed encoding: unsupported version {0}")]
    UnsupportedVersion(u8),
    #[error("malformed encoding: invalid presence flag {0}")]
    InvalidFlag(u8),
    #[error("malformed encoding: length prefix {0} exceeds input")]
    LengthOverflow(u64),
}

// =============================================================================
// Traits
// =============================================================================

/// Types with a canonical binary form
pub trait Encode {
    /// Append the unversioned body encoding to `out`
    fn encode_body(&self, out: &mut Vec<u8>);

    /// Versioned canonical encoding
    fn encode(&self) -> Vec<u8> {
        let mut out = vec![CODEC_VERSION];
        self.encode_body(&mut out);
        out
    }
}

/// Types that can be read back from their canonical binary form
pub trait Decode: Sized {
    /// Read the unversioned body from the front of `input`
    fn decode_body(input: &mut &[u8]) -> Result<Self, CodecError>;

    /// Decode a complete versioned encoding; trailing bytes are an error
    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut input = bytes;
        let version = read_u8(&mut input)?;
        if version != CODEC_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let value = Self::decode_body(&mut input)?;
        if !input.is_empty() {
            return Err(CodecError::TrailingBytes(input.len()));
        }
        Ok(value)
    }
}

// =============================================================================
// Primitive readers / writers
// =============================================================================

fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8], CodecError> {
    if input.len() < n {
        return Err(CodecError::Truncated {
            needed: n,
            remaining: input.len(),
        });
    }
    let (head, rest) = input.split_at(n);
    *input = rest;
    Ok(head)
}

fn read_array<const N: usize>(input: &mut &[u8]) -> Result<[u8; N], CodecError> {
    let mut out = [0u8; N];
    out.copy_from_slice(take(input, N)?);
    Ok(out)
}

fn read_u8(input: &mut &[u8]) -> Result<u8, CodecError> {
    Ok(take(input, 1)?[0])
}

fn read_u32(input: &mut &[u8]) -> Result<u32, CodecError> {
    Ok(u32::from_le_bytes(read_array(input)?))
}

fn read_u64(input: &mut &[u8]) -> Result<u64, CodecError> {
    Ok(u64::from_le_bytes(read_array(input)?))
}

fn read_i64(input: &mut &[u8]) -> Result<i64, CodecError> {
    Ok(i64::from_le_bytes(read_array(input)?))
}

fn read_flag(input: &mut &[u8]) -> Result<bool, CodecError> {
    match read_u8(input)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CodecError::InvalidFlag(other)),
    }
}

fn read_bytes(input: &mut &[u8]) -> Result<Vec<u8>, CodecError> {
    let len = read_u64(input)?;
    let len_usize = usize::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
    if len_usize > input.len() {
        return Err(CodecError::LengthOverflow(len));
    }
    Ok(take(input, len_usize)?.to_vec())
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

// =============================================================================
// Header
// =============================================================================

impl Encode for Header {
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.prev_block_hash.as_bytes());
        out.extend_from_slice(self.tx_hash.as_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out.push(self.difficulty);
    }
}

impl Decode for Header {
    fn decode_body(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Header {
            prev_block_hash: Hash(read_array(input)?),
            tx_hash: Hash(read_array(input)?),
            version: read_u32(input)?,
            height: read_u64(input)?,
            timestamp: read_i64(input)?,
            nonce: read_u64(input)?,
            difficulty: read_u8(input)?,
        })
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Append the signed fields of a transaction (everything but the
/// signature and the cached hash)
fn write_transaction_payload(tx: &Transaction, out: &mut Vec<u8>) {
    out.extend_from_slice(tx.from().as_bytes());
    out.extend_from_slice(tx.to().as_bytes());
    out.extend_from_slice(&tx.value().to_le_bytes());
    write_bytes(out, tx.data());
    out.extend_from_slice(&tx.nonce().to_le_bytes());
}

/// Versioned encoding of the signed fields of a transaction.
///
/// This is the transaction hash pre-image.
pub fn encode_transaction_payload(tx: &Transaction) -> Vec<u8> {
    let mut out = vec![CODEC_VERSION];
    write_transaction_payload(tx, &mut out);
    out
}

impl Encode for Transaction {
    fn encode_body(&self, out: &mut Vec<u8>) {
        write_transaction_payload(self, out);
        match self.signature() {
            Some(sig) => {
                out.push(1);
                out.extend_from_slice(sig.as_bytes());
            }
            None => out.push(0),
        }
    }
}

impl Decode for Transaction {
    fn decode_body(input: &mut &[u8]) -> Result<Self, CodecError> {
        let from = PublicKey(read_array(input)?);
        let to = PublicKey(read_array(input)?);
        let value = read_u64(input)?;
        let data = read_bytes(input)?;
        let nonce = read_i64(input)?;
        let signature = if read_flag(input)? {
            Some(Signature(read_array(input)?))
        } else {
            None
        };
        Ok(Transaction::from_parts(from, to, value, data, nonce, signature))
    }
}

// =============================================================================
// Block
// =============================================================================

impl Encode for Block {
    fn encode_body(&self, out: &mut Vec<u8>) {
        self.header().encode_body(out);
        out.extend_from_slice(&(self.transactions().len() as u64).to_le_bytes());
        for tx in self.transactions() {
            tx.encode_body(out);
        }
        match (self.public_key(), self.signature()) {
            (Some(public_key), Some(signature)) => {
                out.push(1);
                out.extend_from_slice(public_key.as_bytes());
                out.extend_from_slice(signature.as_bytes());
            }
            _ => out.push(0),
        }
    }
}

impl Decode for Block {
    fn decode_body(input: &mut &[u8]) -> Result<Self, CodecError> {
        let header = Header::decode_body(input)?;
        let count = read_u64(input)?;
        // Each transaction needs far more than one byte, so a count larger
        // than the remaining input can never be satisfied.
        if count > input.len() as u64 {
            return Err(CodecError::LengthOverflow(count));
        }
        let mut transactions = Vec::new();
        for _ in 0..count {
            transactions.push(Transaction::decode_body(input)?);
        }
        let seal = if read_flag(input)? {
            let public_key = PublicKey(read_array(input)?);
            let signature = Signature(read_array(input)?);
            Some((public_key, signature))
        } else {
            None
        };
        Ok(Block::from_parts(header, transactions, seal))
    }
}
