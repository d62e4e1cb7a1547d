//! An in-process [`Transport`] for simulations and tests.

use crate::{
    error::{ConnectError, ConsumeError, SendError},
    signal, NetAddr, Rpc, Transport,
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::HashMap,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;


/// The default number of messages a [`LocalTransport`] queues before senders wait.
pub const DEFAULT_INBOUND_CAPACITY: usize = 1024;

/// A transport that delivers messages between endpoints in the same process.
///
/// Cloning produces another handle to the same endpoint.
#[derive(Clone)]
pub struct LocalTransport(Arc<Inner>);

/// The inbound message stream of a [`LocalTransport`].
///
/// Ends once the transport is closed (or every handle to it is dropped) and
/// all messages queued before that point have been yielded.
pub struct Inbound {
    rx: mpsc::Receiver<Rpc>,
    close: WatchStream<bool>,
    closing: bool,
}

struct Inner {
    addr: NetAddr,
    peers: RwLock<HashMap<NetAddr, Peer>>,
    inbound_tx: mpsc::Sender<Rpc>,
    inbound_rx: Mutex<Option<mpsc::Receiver<Rpc>>>,
    close: watch::Sender<bool>,
}

/// What a transport needs to reach a connected peer.
#[derive(Clone)]
struct Peer {
    inbound: mpsc::Sender<Rpc>,
    closed: watch::Receiver<bool>,
}

impl LocalTransport {
    /// Create a transport at `addr` with [`DEFAULT_INBOUND_CAPACITY`].
    pub fn new(addr: impl Into<NetAddr>) -> Self {
        Self::with_capacity(addr, DEFAULT_INBOUND_CAPACITY)
    }

    /// Create a transport at `addr` that queues up to `capacity` inbound messages.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(addr: impl Into<NetAddr>, capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (close, _) = watch::channel(false);
        Self(Arc::new(Inner {
            addr: addr.into(),
            peers: RwLock::new(HashMap::new()),
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            close,
        }))
    }

    /// Whether `addr` has been registered with [`Transport::connect`].
    pub fn is_connected(&self, addr: &NetAddr) -> bool {
        self.0.peers.read().contains_key(addr)
    }

    /// Whether [`Transport::close`] has been called.
    pub fn is_closed(&self) -> bool {
        *self.0.close.borrow()
    }

    /// Deliver `payload` to `to` without waiting for queue space.
    ///
    /// Fails with [`SendError::QueueFull`] where [`Transport::send_message`]
    /// would wait.
    pub fn try_send_message(&self, to: &NetAddr, payload: Bytes) -> Result<(), SendError> {
        let peer = self.peer(to)?;
        if *peer.closed.borrow() {
            return Err(SendError::PeerClosed(to.clone()));
        }
        peer.inbound
            .try_send(self.rpc(payload))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => SendError::QueueFull(to.clone()),
                mpsc::error::TrySendError::Closed(_) => SendError::PeerClosed(to.clone()),
            })
    }

    /// Look up a peer, holding the table lock only for the lookup.
    fn peer(&self, to: &NetAddr) -> Result<Peer, SendError> {
        self.0
            .peers
            .read()
            .get(to)
            .cloned()
            .ok_or_else(|| SendError::PeerUnreachable {
                from: self.0.addr.clone(),
                to: to.clone(),
            })
    }

    fn rpc(&self, payload: Bytes) -> Rpc {
        Rpc {
            from: self.0.addr.clone(),
            payload,
        }
    }

    async fn send(&self, to: &NetAddr, payload: Bytes) -> Result<(), SendError> {
        let peer = self.peer(to)?;
        let Peer {
            inbound,
            mut closed,
        } = peer;
        if *closed.borrow_and_update() {
            return Err(SendError::PeerClosed(to.clone()));
        }
        let rpc = self.rpc(payload);
        tokio::select! {
            biased;
            _ = signal::raised(&mut closed) => Err(SendError::PeerClosed(to.clone())),
            r = inbound.send(rpc) => r.map_err(|_| SendError::PeerClosed(to.clone())),
        }
    }
}

impl Transport for LocalTransport {
    type Inbound = Inbound;

    fn addr(&self) -> &NetAddr {
        &self.0.addr
    }

    fn connect(&self, peer: &Self) -> Result<(), ConnectError> {
        let entry = Peer {
            inbound: peer.0.inbound_tx.clone(),
            closed: peer.0.close.subscribe(),
        };
        self.0.peers.write().insert(peer.0.addr.clone(), entry);
        #[cfg(feature = "tracing")]
        tracing::trace!(from = %self.0.addr, to = %peer.0.addr, "connected");
        Ok(())
    }

    async fn send_message(&self, to: &NetAddr, payload: Bytes) -> Result<(), SendError> {
        let r = self.send(to, payload).await;
        #[cfg(feature = "tracing")]
        if let Err(e) = &r {
            tracing::debug!("{e}");
        }
        r
    }

    fn consume(&self) -> Result<Inbound, ConsumeError> {
        let rx = self
            .0
            .inbound_rx
            .lock()
            .take()
            .ok_or_else(|| ConsumeError::AlreadyConsumed(self.0.addr.clone()))?;
        Ok(Inbound {
            rx,
            close: WatchStream::new(self.0.close.subscribe()),
            closing: false,
        })
    }

    fn close(&self) {
        let was_closed = self.0.close.send_replace(true);
        #[cfg(feature = "tracing")]
        if !was_closed {
            tracing::debug!(addr = %self.0.addr, "transport closed");
        }
        #[cfg(not(feature = "tracing"))]
        let _ = was_closed;
    }
}

impl core::fmt::Debug for LocalTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let peers: Vec<NetAddr> = self.0.peers.read().keys().cloned().collect();
        f.debug_struct("LocalTransport")
            .field("addr", &self.0.addr)
            .field("peers", &peers)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Stream for Inbound {
    type Item = Rpc;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Rpc>> {
        let this = self.get_mut();
        while !this.closing {
            match this.close.poll_next_unpin(cx) {
                Poll::Ready(Some(false)) => continue,
                // Closed, or every handle to the transport was dropped.
                Poll::Ready(Some(true)) | Poll::Ready(None) => {
                    this.closing = true;
                    // Stop accepting sends but keep what is already queued.
                    this.rx.close();
                }
                Poll::Pending => break,
            }
        }
        this.rx.poll_recv(cx)
    }
}
