//! Peer transports and the server that multiplexes their inbound messages.
//!
//! A [`Transport`] moves opaque payloads between logical peers. The
//! [`Server`] owns a fixed set of transports, relays each one's inbound
//! stream onto a single dispatch channel and processes every message on one
//! loop alongside periodic housekeeping.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub use error::{ConnectError, ConsumeError, SendError, StartError};
pub use local::LocalTransport;
pub use server::{handle::Handle, LogRpc, RpcHandler, Server, ServerOpts, Shutdown};
pub use transport::{NetAddr, Rpc, Transport};

mod error;
pub mod local;
pub mod server;
mod signal;
pub mod transport;
