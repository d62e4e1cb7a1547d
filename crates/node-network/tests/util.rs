#![allow(dead_code)]

use modular_node_network::{LocalTransport, Transport};

#[cfg(feature = "tracing")]
pub fn init_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Create transports named `addrs` where every transport can send to every other one.
pub fn mesh(addrs: &[&str]) -> Vec<LocalTransport> {
    let transports: Vec<_> = addrs.iter().map(|&a| LocalTransport::new(a)).collect();
    for t in &transports {
        for peer in &transports {
            if t.addr() != peer.addr() {
                t.connect(peer).unwrap();
            }
        }
    }
    transports
}
