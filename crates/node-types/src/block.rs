//! The `Block` and `Header` types and their canonical encoding.

use crate::{
    codec::{self, DecodeError, EncodeError},
    Hash,
};
use std::io::{Read, Write};

pub mod hash;

/// A block: a header plus its ordered transactions.
///
/// The block's identity is [`Block::hash`], which only covers the header.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Block {
    /// Metadata for the block.
    pub header: Header,
    /// The transactions carried by the block, in order.
    pub transactions: Vec<Transaction>,
}

/// The block header, containing metadata about the block.
///
/// `height` and `nonce` are only set by the block producer via
/// [`Header::new`] and are otherwise read-only.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Header {
    /// The header format version.
    pub version: u32,
    /// The hash of the previous block, or [`Hash::ZERO`] for the first block.
    pub prev_block: Hash,
    /// Nanoseconds since `UNIX_EPOCH` at which the block was produced.
    pub timestamp: u64,
    height: u32,
    nonce: u64,
}

/// An opaque transaction.
///
/// Transaction semantics live outside this crate; blocks only carry and
/// round-trip the bytes.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Transaction {
    /// The raw transaction bytes.
    pub data: Vec<u8>,
}

impl Header {
    /// Length in bytes of the canonical header encoding.
    ///
    /// `version (4) | prev_block (32) | timestamp (8) | height (4) | nonce (8)`
    pub const ENCODED_LEN: usize = 4 + Hash::LEN + 8 + 4 + 8;

    /// Construct a header.
    pub fn new(version: u32, prev_block: Hash, timestamp: u64, height: u32, nonce: u64) -> Self {
        Self {
            version,
            prev_block,
            timestamp,
            height,
            nonce,
        }
    }

    /// The index of the block in the chain.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The producer's proof/fill value.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The content address of this header.
    pub fn hash(&self) -> Hash {
        hash::from_header(self)
    }

    /// The canonical encoding as a fixed-size array.
    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        let (version, rest) = out.split_at_mut(4);
        let (prev_block, rest) = rest.split_at_mut(Hash::LEN);
        let (timestamp, rest) = rest.split_at_mut(8);
        let (height, nonce) = rest.split_at_mut(4);
        version.copy_from_slice(&self.version.to_le_bytes());
        prev_block.copy_from_slice(self.prev_block.as_bytes());
        timestamp.copy_from_slice(&self.timestamp.to_le_bytes());
        height.copy_from_slice(&self.height.to_le_bytes());
        nonce.copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    /// Write the canonical encoding to `sink`.
    pub fn encode_binary(&self, sink: &mut impl Write) -> Result<(), EncodeError> {
        sink.write_all(&self.encode())?;
        Ok(())
    }

    /// Read a header from `source`.
    ///
    /// Fails with [`DecodeError::TruncatedInput`] if `source` runs out before
    /// [`Header::ENCODED_LEN`] bytes are read.
    pub fn decode_binary(source: &mut impl Read) -> Result<Self, DecodeError> {
        // Read the full layout first so that no field is decoded from a short read.
        let bytes: [u8; Self::ENCODED_LEN] = codec::read_array(source)?;
        let mut input = &bytes[..];
        Ok(Self {
            version: codec::read_u32_le(&mut input)?,
            prev_block: codec::read_hash(&mut input)?,
            timestamp: codec::read_u64_le(&mut input)?,
            height: codec::read_u32_le(&mut input)?,
            nonce: codec::read_u64_le(&mut input)?,
        })
    }

    /// Decode a header from exactly [`Header::ENCODED_LEN`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        codec::decode_exact(bytes, Self::decode_binary)
    }
}

impl Block {
    /// Construct a block from its header and transactions.
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// The content address of the block, i.e. the hash of its header.
    pub fn hash(&self) -> Hash {
        hash::from_block(self)
    }

    /// Write the canonical encoding to `sink`.
    ///
    /// The header encoding is followed by a `u32` transaction count and each
    /// transaction as `u32` length-prefixed bytes.
    pub fn encode_binary(&self, sink: &mut impl Write) -> Result<(), EncodeError> {
        self.header.encode_binary(sink)?;
        codec::write_len(sink, self.transactions.len())?;
        for tx in &self.transactions {
            codec::write_bytes(sink, &tx.data)?;
        }
        Ok(())
    }

    /// Read a block from `source`.
    pub fn decode_binary(source: &mut impl Read) -> Result<Self, DecodeError> {
        let header = Header::decode_binary(source)?;
        let count = codec::read_len(source)?;
        let mut transactions = Vec::with_capacity(codec::prealloc(count));
        for _ in 0..count {
            let data = codec::read_bytes(source)?;
            transactions.push(Transaction { data });
        }
        Ok(Self {
            header,
            transactions,
        })
    }

    /// The canonical encoding as a byte vector.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(Header::ENCODED_LEN + 4);
        self.encode_binary(&mut out)?;
        Ok(out)
    }

    /// Decode a block from `bytes`, rejecting trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        codec::decode_exact(bytes, Self::decode_binary)
    }
}

impl From<Vec<u8>> for Transaction {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}
