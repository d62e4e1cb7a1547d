//! Content addressing for [`Header`] and [`Block`].

use super::{Block, Header};
use crate::{hash::digest, Hash};

/// Produce the content address of a header.
///
/// This is the SHA-256 digest of the header's canonical encoding, so two
/// headers with equal fields always share a hash regardless of how they were
/// constructed or decoded.
pub fn from_header(header: &Header) -> Hash {
    digest(&header.encode())
}

/// Shorthand for the content address of a [`Block`].
///
/// *Note:* the block hash covers only the header. Transactions are not part
/// of the digest, so two blocks that differ only in their transactions share
/// an address.
pub fn from_block(block: &Block) -> Hash {
    from_header(&block.header)
}
