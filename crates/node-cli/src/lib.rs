use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use modular_node_network::{
    local::DEFAULT_INBOUND_CAPACITY, LocalTransport, NetAddr, SendError, Server, ServerOpts,
    Transport,
};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};


/// The modular node CLI.
///
/// Runs a server over a local transport while a simulated remote peer
/// sends it a message at a fixed interval.
#[derive(Parser, Clone, Debug)]
#[command(version, about)]
pub struct Args {
    /// The address of the transport served by this node.
    #[arg(long, default_value = "LOCAL")]
    local_addr: String,
    /// The address of the simulated remote peer.
    #[arg(long, default_value = "REMOTE")]
    remote_addr: String,
    /// The payload the remote peer sends.
    #[arg(long, default_value = "hello")]
    message: String,
    /// Milliseconds between messages from the remote peer.
    #[arg(long, default_value_t = 1_000)]
    send_interval_ms: u64,
    /// Milliseconds between the server's housekeeping ticks.
    #[arg(long, default_value_t = 5_000)]
    tick_interval_ms: u64,
    /// The number of messages each transport queues before senders wait.
    #[arg(long, default_value_t = DEFAULT_INBOUND_CAPACITY)]
    inbound_capacity: usize,
    /// Disable the tracing subscriber.
    #[arg(long)]
    disable_tracing: bool,
}

#[cfg(feature = "tracing")]
fn init_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Check the args describe a runnable node.
fn validate_args(args: &Args) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.local_addr != args.remote_addr,
        "local and remote addresses must differ (both are {:?})",
        args.local_addr
    );
    anyhow::ensure!(args.send_interval_ms > 0, "send interval must be non-zero");
    anyhow::ensure!(args.tick_interval_ms > 0, "tick interval must be non-zero");
    anyhow::ensure!(args.inbound_capacity > 0, "inbound capacity must be non-zero");
    Ok(())
}

/// Send `payload` from `from` to `to` every `period` until a send fails.
async fn send_forever(
    from: LocalTransport,
    to: NetAddr,
    payload: Bytes,
    period: Duration,
) -> Result<(), SendError> {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        from.send_message(&to, payload.clone()).await?;
    }
}

/// Run the modular node.
pub async fn run(args: Args) -> anyhow::Result<()> {
    // Initialise tracing.
    if !args.disable_tracing {
        #[cfg(feature = "tracing")]
        init_tracing_subscriber()
    }

    validate_args(&args)?;
    #[cfg(feature = "tracing")]
    tracing::debug!("Node args:\n{:#?}", args);

    // Build both endpoints and connect them in each direction.
    let local = LocalTransport::with_capacity(args.local_addr.as_str(), args.inbound_capacity);
    let remote = LocalTransport::with_capacity(args.remote_addr.as_str(), args.inbound_capacity);
    local
        .connect(&remote)
        .context("failed to connect local transport to remote")?;
    remote
        .connect(&local)
        .context("failed to connect remote transport to local")?;

    // The simulated remote peer.
    let mut sender = tokio::spawn(send_forever(
        remote.clone(),
        local.addr().clone(),
        Bytes::from(args.message.clone()),
        Duration::from_millis(args.send_interval_ms),
    ));

    // Serve the local transport.
    let mut opts = ServerOpts::new(vec![local.clone()]);
    opts.tick_interval = Duration::from_millis(args.tick_interval_ms);
    #[cfg(feature = "tracing")]
    tracing::info!("Starting server at {}", local.addr());
    let server = Server::new(opts).spawn();

    // Select the first future to complete to close.
    let ctrl_c = tokio::signal::ctrl_c();
    let result = tokio::select! {
        r = ctrl_c => r.context("failed to listen for ctrl-c"),
        r = &mut sender => match r {
            Ok(Err(e)) => Err(e).context("remote peer stopped sending"),
            Ok(Ok(())) => Ok(()),
            Err(e) => Err(e).context("remote peer task failed"),
        },
    };

    #[cfg(feature = "tracing")]
    tracing::info!("Shutting down");
    sender.abort();
    let closed = server.close().await;
    local.close();
    remote.close();
    result?;
    closed.context("server failed")?;
    Ok(())
}
