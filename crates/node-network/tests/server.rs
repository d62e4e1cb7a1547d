use bytes::Bytes;
use modular_node_network::{Rpc, Server, ServerOpts, Transport};
use modular_node_types::{Block, Hash, Header, Transaction};
use std::time::Duration;
use tokio::sync::mpsc;

mod util;

const TIMEOUT: Duration = Duration::from_secs(2);

fn block(height: u32, prev_block: Hash, txs: &[&[u8]]) -> Block {
    Block::new(
        Header::new(1, prev_block, modular_node_types::timestamp_now(), height, 0),
        txs.iter().map(|tx| Transaction::from(tx.to_vec())).collect(),
    )
}

#[tokio::test]
async fn test_blocks_relayed_between_peers() {
    #[cfg(feature = "tracing")]
    util::init_tracing_subscriber();

    let mut peers = util::mesh(&["LOCAL", "REMOTE"]);
    let remote = peers.pop().unwrap();
    let local = peers.pop().unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = Server::with_handler(ServerOpts::new(vec![local.clone()]), move |rpc: Rpc| {
        let _ = tx.send((rpc.from, Block::decode(&rpc.payload)));
    })
    .spawn();

    let genesis = block(0, Hash::ZERO, &[]);
    let next = block(1, genesis.hash(), &[b"tx-1", b"tx-2"]);
    for b in [&genesis, &next] {
        remote
            .send_message(local.addr(), Bytes::from(b.encode().unwrap()))
            .await
            .unwrap();
    }

    let mut received = vec![];
    for _ in 0..2 {
        let (from, block) = tokio::time::timeout(TIMEOUT, rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(from, "REMOTE");
        received.push(block.unwrap());
    }
    assert_eq!(received, [genesis.clone(), next.clone()]);
    assert!(received[0].header.prev_block.is_zero());
    assert_eq!(received[1].header.prev_block, received[0].hash());

    handle.close().await.unwrap();
    local.close();
    remote.close();
}

#[tokio::test]
async fn test_server_over_many_transports() {
    #[cfg(feature = "tracing")]
    util::init_tracing_subscriber();

    let peers = util::mesh(&["A", "B", "C", "D"]);
    let (servers, senders) = peers.split_at(2);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = Server::with_handler(ServerOpts::new(servers.to_vec()), move |rpc: Rpc| {
        let _ = tx.send(rpc);
    })
    .spawn();

    for from in senders {
        for to in servers {
            let payload = format!("{} -> {}", from.addr(), to.addr());
            from.send_message(to.addr(), Bytes::from(payload))
                .await
                .unwrap();
        }
    }

    let mut payloads = vec![];
    for _ in 0..4 {
        let rpc = tokio::time::timeout(TIMEOUT, rx.recv())
            .await
            .unwrap()
            .unwrap();
        payloads.push(String::from_utf8(rpc.payload.to_vec()).unwrap());
    }
    payloads.sort();
    assert_eq!(payloads, ["C -> A", "C -> B", "D -> A", "D -> B"]);

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_undecodable_payload_reaches_handler() {
    let peers = util::mesh(&["LOCAL", "REMOTE"]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = Server::with_handler(ServerOpts::new(vec![peers[0].clone()]), move |rpc: Rpc| {
        let _ = tx.send(Block::decode(&rpc.payload).is_err());
    })
    .spawn();

    peers[1]
        .send_message(peers[0].addr(), Bytes::from_static(b"not a block"))
        .await
        .unwrap();
    let failed = tokio::time::timeout(TIMEOUT, rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(failed);

    handle.close().await.unwrap();
}
