//! Core types used within the modular node.
//!
//! Block identity is content-addressed: a [`Block`]'s [`Hash`] is the digest
//! of its [`Header`]'s canonical binary encoding. See [`codec`] for the
//! encoding and [`block::hash`] for the digest.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub use block::{Block, Header, Transaction};
pub use codec::{DecodeError, EncodeError};
pub use hash::Hash;

pub mod block;
pub mod codec;
pub mod hash;

/// The current time as nanoseconds since `UNIX_EPOCH`.
///
/// Saturates at `u64::MAX` and returns `0` for clocks set before the epoch.
pub fn timestamp_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
