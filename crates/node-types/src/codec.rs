//! Canonical binary encoding primitives.
//!
//! All integers are little-endian and fixed-width. Nothing in the layout is
//! optional or padded, so a value has exactly one encoding. Field order is
//! identity-relevant: changing it changes every block hash.

use crate::Hash;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Failure to decode a value from its canonical encoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Fewer bytes were available than the layout requires.
    #[error("truncated input: not enough bytes for the encoded layout")]
    TruncatedInput,
    /// Bytes remained after a complete value was decoded from a slice.
    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(usize),
    /// A length prefix does not fit in this platform's `usize`.
    #[error("length prefix {0} exceeds addressable memory")]
    LengthOverflow(u32),
    /// The underlying reader failed for a reason other than running out of bytes.
    #[error("failed to read encoded value: {0}")]
    Io(io::Error),
}

/// Failure to write a value's canonical encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The underlying writer failed.
    #[error("failed to write encoded value: {0}")]
    Io(#[from] io::Error),
    /// A sequence or byte string is too long for its `u32` length prefix.
    #[error("length {0} does not fit in a u32 length prefix")]
    LengthOverflow(usize),
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::TruncatedInput,
            _ => DecodeError::Io(err),
        }
    }
}

// Upper bound on bytes reserved up-front from an untrusted length prefix.
const MAX_PREALLOC: usize = 64 * 1024;

pub(crate) fn read_array<const N: usize>(r: &mut impl Read) -> Result<[u8; N], DecodeError> {
    let mut out = [0u8; N];
    r.read_exact(&mut out)?;
    Ok(out)
}

pub(crate) fn read_u32_le(r: &mut impl Read) -> Result<u32, DecodeError> {
    read_array(r).map(u32::from_le_bytes)
}

pub(crate) fn read_u64_le(r: &mut impl Read) -> Result<u64, DecodeError> {
    read_array(r).map(u64::from_le_bytes)
}

pub(crate) fn read_hash(r: &mut impl Read) -> Result<Hash, DecodeError> {
    read_array(r).map(Hash)
}

/// Read a `u32` length prefix as a `usize`.
pub(crate) fn read_len(r: &mut impl Read) -> Result<usize, DecodeError> {
    let len = read_u32_le(r)?;
    usize::try_from(len).map_err(|_| DecodeError::LengthOverflow(len))
}

/// Read a `u32` length-prefixed byte string.
pub(crate) fn read_bytes(r: &mut impl Read) -> Result<Vec<u8>, DecodeError> {
    let len = read_len(r)?;
    let mut out = Vec::with_capacity(len.min(MAX_PREALLOC));
    let read = r.take(len as u64).read_to_end(&mut out)?;
    if read < len {
        return Err(DecodeError::TruncatedInput);
    }
    Ok(out)
}

/// Capacity to reserve for a sequence of `len` items decoded from untrusted input.
pub(crate) fn prealloc(len: usize) -> usize {
    len.min(MAX_PREALLOC)
}

pub(crate) fn write_len(w: &mut impl Write, len: usize) -> Result<(), EncodeError> {
    let len = u32::try_from(len).map_err(|_| EncodeError::LengthOverflow(len))?;
    w.write_all(&len.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_bytes(w: &mut impl Write, bytes: &[u8]) -> Result<(), EncodeError> {
    write_len(w, bytes.len())?;
    w.write_all(bytes)?;
    Ok(())
}

/// Decode a complete value from `bytes`, rejecting any trailing bytes.
pub(crate) fn decode_exact<'a, T>(
    mut bytes: &'a [u8],
    decode: impl FnOnce(&mut &'a [u8]) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    let value = decode(&mut bytes)?;
    if !bytes.is_empty() {
        return Err(DecodeError::TrailingBytes(bytes.len()));
    }
    Ok(value)
}
