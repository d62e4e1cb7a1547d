//! The transport abstraction shared by every peer endpoint implementation.

use crate::error::{ConnectError, ConsumeError, SendError};
use bytes::Bytes;
use futures::Stream;
use std::{fmt, future::Future, sync::Arc};

/// The address of a peer.
///
/// An opaque, cheaply cloneable token that is unique per logical peer within
/// a process.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NetAddr(Arc<str>);

/// A single message received from a peer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rpc {
    /// The address of the sending transport.
    pub from: NetAddr,
    /// The message bytes.
    pub payload: Bytes,
}

/// A communication endpoint for one logical node.
///
/// Implementations must be usable from many tasks at once. A production wire
/// transport satisfies the same contract as the in-memory
/// [`LocalTransport`][crate::LocalTransport].
pub trait Transport: Send + Sync + 'static {
    /// The stream of messages received by this transport.
    type Inbound: Stream<Item = Rpc> + Send + Unpin + 'static;

    /// The address of this transport.
    fn addr(&self) -> &NetAddr;

    /// Register `peer` as reachable from this transport.
    ///
    /// This is one-directional: `peer` cannot send to this transport until it
    /// connects back.
    fn connect(&self, peer: &Self) -> Result<(), ConnectError>;

    /// Deliver `payload` to the peer at `to`.
    ///
    /// Waits while the peer's inbound queue is full. Messages from one sender
    /// to one receiver are delivered in the order they are sent.
    fn send_message(
        &self,
        to: &NetAddr,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), SendError>> + Send;

    /// Take the inbound message stream.
    ///
    /// There is exactly one consumer per transport; subsequent calls return
    /// [`ConsumeError::AlreadyConsumed`].
    fn consume(&self) -> Result<Self::Inbound, ConsumeError>;

    /// Retire the transport.
    ///
    /// The inbound stream ends once already-queued messages are drained and
    /// further sends to this transport fail with [`SendError::PeerClosed`].
    fn close(&self);
}

impl NetAddr {
    /// Create an address from any string-like value.
    pub fn new(addr: impl Into<Arc<str>>) -> Self {
        Self(addr.into())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NetAddr {
    fn from(addr: &str) -> Self {
        Self::new(addr)
    }
}

impl From<String> for NetAddr {
    fn from(addr: String) -> Self {
        Self::new(addr)
    }
}

impl AsRef<str> for NetAddr {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for NetAddr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for NetAddr {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for NetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl Rpc {
    /// Create a message from `from` carrying `payload`.
    pub fn new(from: NetAddr, payload: impl Into<Bytes>) -> Self {
        Self {
            from,
            payload: payload.into(),
        }
    }
}
