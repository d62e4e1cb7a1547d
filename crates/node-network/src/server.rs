//! The server dispatch loop.

use crate::{error::StartError, signal, NetAddr, Rpc, Transport};
use futures::{Stream, StreamExt};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant, MissedTickBehavior},
};

pub mod handle;
#[cfg(test)]
mod tests;

/// The default period between housekeeping ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// The default capacity of the channel shared by the forwarding tasks.
///
/// A capacity of one means a forwarding task hands over at most one message
/// before waiting on the dispatch loop.
pub const DEFAULT_DISPATCH_CAPACITY: usize = 1;

/// All configuration options for a [`Server`] instance.
#[derive(Clone, Debug)]
pub struct ServerOpts<T> {
    /// The transports whose inbound messages the server processes.
    pub transports: Vec<T>,
    /// The period between calls to [`RpcHandler::on_tick`].
    pub tick_interval: Duration,
    /// The capacity of the channel between the forwarding tasks and the
    /// dispatch loop. Zero is treated as one.
    pub dispatch_capacity: usize,
}

/// Processes the messages and housekeeping ticks of a running [`Server`].
///
/// Implemented for any `FnMut(Rpc)`, which is handy in tests.
pub trait RpcHandler: Send + 'static {
    /// Process one message received on any of the server's transports.
    fn handle_rpc(&mut self, rpc: Rpc);

    /// Periodic housekeeping.
    fn on_tick(&mut self) {}
}

/// The default [`RpcHandler`] which logs every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogRpc;

/// Signals a [`Server`] to stop its dispatch loop.
///
/// Cloneable, so it can be handed to any task before the server is started.
#[derive(Clone, Debug)]
pub struct Shutdown(Arc<watch::Sender<bool>>);

/// Routes inbound messages from many transports onto a single dispatch loop.
pub struct Server<T, H = LogRpc> {
    opts: ServerOpts<T>,
    handler: H,
    shutdown: Shutdown,
}

impl<T> ServerOpts<T> {
    /// Options for a server over `transports`, with all other options at their defaults.
    pub fn new(transports: Vec<T>) -> Self {
        Self {
            transports,
            tick_interval: DEFAULT_TICK_INTERVAL,
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
        }
    }
}

impl<T> Default for ServerOpts<T> {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl<T: Transport> Server<T> {
    /// Create a server that logs every message it receives.
    pub fn new(opts: ServerOpts<T>) -> Self {
        Self::with_handler(opts, LogRpc)
    }
}

impl<T, H> Server<T, H>
where
    T: Transport,
    H: RpcHandler,
{
    /// Create a server that passes every message to `handler`.
    pub fn with_handler(opts: ServerOpts<T>, handler: H) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            opts,
            handler,
            shutdown: Shutdown(Arc::new(shutdown)),
        }
    }

    /// A signal that stops this server's dispatch loop.
    pub fn shutdown_signal(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run the server until its [`Shutdown`] signal is raised.
    ///
    /// Takes the inbound stream of every transport, starts one forwarding task
    /// per transport and then processes messages and ticks on the calling task.
    /// Forwarding tasks are not aborted on shutdown: each one finishes when its
    /// transport is closed or when it next tries to hand over a message.
    pub async fn start(self) -> Result<(), StartError> {
        let Self {
            opts,
            mut handler,
            shutdown,
        } = self;
        let ServerOpts {
            transports,
            tick_interval,
            dispatch_capacity,
        } = opts;

        if tick_interval.is_zero() {
            return Err(StartError::ZeroTickInterval);
        }

        // Take every stream before spawning so a failure leaves nothing running.
        let inbound = transports
            .iter()
            .map(|t| -> Result<_, StartError> { Ok((t.addr().clone(), t.consume()?)) })
            .collect::<Result<Vec<_>, _>>()?;

        let (rpc_tx, mut rpc_rx) = mpsc::channel(dispatch_capacity.max(1));
        for (addr, stream) in inbound {
            forward(addr, stream, rpc_tx.clone());
        }
        drop(rpc_tx);

        let mut ticker = time::interval_at(Instant::now() + tick_interval, tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stop = shutdown.0.subscribe();
        let mut forwarding = true;

        #[cfg(feature = "tracing")]
        tracing::info!(transports = transports.len(), "Server running");

        loop {
            tokio::select! {
                rpc = rpc_rx.recv(), if forwarding => match rpc {
                    Some(rpc) => handler.handle_rpc(rpc),
                    None => {
                        // Every transport has been closed.
                        forwarding = false;
                        #[cfg(feature = "tracing")]
                        tracing::debug!("All transports closed");
                    }
                },
                _ = ticker.tick() => handler.on_tick(),
                _ = signal::raised(&mut stop) => break,
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Server shutdown");
        Ok(())
    }
}

/// Relay every message of one transport's inbound stream onto the dispatch channel.
fn forward<S>(addr: NetAddr, mut inbound: S, rpc_tx: mpsc::Sender<Rpc>)
where
    S: Stream<Item = Rpc> + Send + Unpin + 'static,
{
    #[cfg(feature = "tracing")]
    tracing::debug!(%addr, "Forwarding inbound messages");
    tokio::spawn(async move {
        while let Some(rpc) = inbound.next().await {
            if rpc_tx.send(rpc).await.is_err() {
                // The dispatch loop has stopped.
                break;
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(%addr, "Stopped forwarding inbound messages");
        #[cfg(not(feature = "tracing"))]
        let _ = addr;
    });
}

impl Shutdown {
    /// Stop the server. Idempotent.
    pub fn shutdown(&self) {
        self.0.send_replace(true);
    }

    /// Whether the signal has been raised.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }
}

impl RpcHandler for LogRpc {
    fn handle_rpc(&mut self, rpc: Rpc) {
        #[cfg(feature = "tracing")]
        tracing::info!(from = %rpc.from, len = rpc.payload.len(), payload = ?rpc.payload, "Received rpc");
        #[cfg(not(feature = "tracing"))]
        let _ = rpc;
    }

    fn on_tick(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::trace!("Tick");
    }
}

impl<F> RpcHandler for F
where
    F: FnMut(Rpc) + Send + 'static,
{
    fn handle_rpc(&mut self, rpc: Rpc) {
        self(rpc)
    }
}
