//! The fixed-width content digest used for block identity.

use core::{fmt, str::FromStr};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// A 32-byte SHA-256 digest.
///
/// The all-zero value is reserved as a sentinel (e.g. "no previous block") and
/// can be checked with [`Hash::is_zero`].
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Hash(pub [u8; 32]);

/// A byte slice of the wrong length was converted into a [`Hash`].
#[derive(Debug, Error)]
#[error("invalid hash length: expected {} bytes, got {0}", Hash::LEN)]
pub struct InvalidHashLength(pub usize);

/// Failed to parse a [`Hash`] from a hex string.
#[derive(Debug, Error)]
pub enum ParseHashError {
    /// The string was not valid hex.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// The decoded bytes were not [`Hash::LEN`] long.
    #[error(transparent)]
    Length(#[from] InvalidHashLength),
}

impl Hash {
    /// Number of bytes in a hash.
    pub const LEN: usize = 32;

    /// The all-zero hash.
    pub const ZERO: Self = Self([0; Self::LEN]);

    /// Whether every byte of the hash is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

/// Hash the given bytes with SHA-256.
pub fn digest(bytes: &[u8]) -> Hash {
    Hash(Sha256::digest(bytes).into())
}

impl From<[u8; Hash::LEN]> for Hash {
    fn from(bytes: [u8; Hash::LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; Hash::LEN] {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl TryFrom<&[u8]> for Hash {
    type Error = InvalidHashLength;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; Hash::LEN] = bytes
            .try_into()
            .map_err(|_| InvalidHashLength(bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Hash {
    type Err = ParseHashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Ok(Self::try_from(&bytes[..])?)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({self})")
    }
}
