use crate::NetAddr;
use thiserror::Error;

/// Failure to register a peer with a transport.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The peer could not be reached.
    ///
    /// Only produced by transports backed by a real network. Connecting two
    /// [`LocalTransport`][crate::LocalTransport]s cannot fail.
    #[error("failed to connect to peer: {0}")]
    ConnectionFailure(String),
}

/// Failure to deliver a message to a peer.
#[derive(Debug, Error)]
pub enum SendError {
    /// The destination is not in the sender's peer table.
    #[error("{from}: couldn't send message to {to}: peer unreachable")]
    PeerUnreachable {
        /// The sending transport.
        from: NetAddr,
        /// The unknown destination.
        to: NetAddr,
    },
    /// The destination transport has been closed.
    #[error("couldn't send message to {0}: peer closed")]
    PeerClosed(NetAddr),
    /// The destination's inbound queue is full.
    ///
    /// Only returned by non-blocking sends.
    #[error("couldn't send message to {0}: inbound queue full")]
    QueueFull(NetAddr),
}

/// Failure to obtain a transport's inbound stream.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// The inbound stream has already been handed to another consumer.
    #[error("inbound stream of {0} has already been consumed")]
    AlreadyConsumed(NetAddr),
}

/// Failure to start the server dispatch loop.
#[derive(Debug, Error)]
pub enum StartError {
    /// One of the server's transports could not provide its inbound stream.
    #[error(transparent)]
    Consume(#[from] ConsumeError),
    /// The housekeeping interval must be non-zero.
    #[error("server tick interval must be greater than zero")]
    ZeroTickInterval,
}
