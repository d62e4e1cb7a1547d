use super::*;
use crate::LocalTransport;
use bytes::Bytes;

const TIMEOUT: Duration = Duration::from_secs(2);

/// A handler that forwards everything it sees to the test.
#[derive(Clone)]
struct Probe {
    rpcs: mpsc::UnboundedSender<Rpc>,
    ticks: mpsc::UnboundedSender<()>,
}

fn probe() -> (
    Probe,
    mpsc::UnboundedReceiver<Rpc>,
    mpsc::UnboundedReceiver<()>,
) {
    let (rpcs, rpc_rx) = mpsc::unbounded_channel();
    let (ticks, tick_rx) = mpsc::unbounded_channel();
    (Probe { rpcs, ticks }, rpc_rx, tick_rx)
}

impl RpcHandler for Probe {
    fn handle_rpc(&mut self, rpc: Rpc) {
        let _ = self.rpcs.send(rpc);
    }

    fn on_tick(&mut self) {
        let _ = self.ticks.send(());
    }
}

#[tokio::test]
async fn test_handler_receives_messages_from_every_transport() {
    let a = LocalTransport::new("A");
    let b = LocalTransport::new("B");
    let c = LocalTransport::new("C");
    c.connect(&a).unwrap();
    c.connect(&b).unwrap();

    let (handler, mut rpcs, _ticks) = probe();
    let handle =
        Server::with_handler(ServerOpts::new(vec![a.clone(), b.clone()]), handler).spawn();

    c.send_message(a.addr(), Bytes::from_static(b"to a"))
        .await
        .unwrap();
    c.send_message(b.addr(), Bytes::from_static(b"to b"))
        .await
        .unwrap();

    let mut got = vec![];
    for _ in 0..2 {
        let rpc = time::timeout(TIMEOUT, rpcs.recv()).await.unwrap().unwrap();
        assert_eq!(rpc.from, "C");
        got.push(rpc.payload);
    }
    got.sort();
    assert_eq!(got, [&b"to a"[..], &b"to b"[..]]);

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_messages_from_one_sender_stay_ordered() {
    let a = LocalTransport::new("A");
    let c = LocalTransport::new("C");
    c.connect(&a).unwrap();

    let (handler, mut rpcs, _ticks) = probe();
    let handle = Server::with_handler(ServerOpts::new(vec![a.clone()]), handler).spawn();

    for i in 0..20u8 {
        c.send_message(a.addr(), Bytes::from(vec![i])).await.unwrap();
    }
    for i in 0..20u8 {
        let rpc = time::timeout(TIMEOUT, rpcs.recv()).await.unwrap().unwrap();
        assert_eq!(rpc.payload[..], [i]);
    }

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_start() {
    let a = LocalTransport::new("A");
    let server = Server::new(ServerOpts::new(vec![a]));
    let shutdown = server.shutdown_signal();
    let task = tokio::spawn(server.start());

    time::sleep(Duration::from_millis(20)).await;
    assert!(!task.is_finished());
    shutdown.shutdown();
    assert!(shutdown.is_shutdown());

    time::timeout(TIMEOUT, task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_before_start() {
    let server = Server::new(ServerOpts::new(vec![LocalTransport::new("A")]));
    server.shutdown_signal().shutdown();
    time::timeout(TIMEOUT, server.start())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_ticks_reach_handler() {
    let a = LocalTransport::new("A");
    let (handler, _rpcs, mut ticks) = probe();
    let mut opts = ServerOpts::new(vec![a]);
    opts.tick_interval = Duration::from_millis(10);
    let handle = Server::with_handler(opts, handler).spawn();

    for _ in 0..3 {
        time::timeout(TIMEOUT, ticks.recv()).await.unwrap().unwrap();
    }

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_keeps_ticking_after_transports_close() {
    let a = LocalTransport::new("A");
    let (handler, _rpcs, mut ticks) = probe();
    let mut opts = ServerOpts::new(vec![a.clone()]);
    opts.tick_interval = Duration::from_millis(10);
    let handle = Server::with_handler(opts, handler).spawn();

    a.close();
    time::sleep(Duration::from_millis(20)).await;
    while ticks.try_recv().is_ok() {}
    time::timeout(TIMEOUT, ticks.recv()).await.unwrap().unwrap();
    assert!(!handle.is_finished());

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_zero_tick_interval() {
    let mut opts = ServerOpts::new(vec![LocalTransport::new("A")]);
    opts.tick_interval = Duration::ZERO;
    assert!(matches!(
        Server::new(opts).start().await,
        Err(StartError::ZeroTickInterval)
    ));
}

#[tokio::test]
async fn test_already_consumed_transport() {
    let a = LocalTransport::new("A");
    let _inbound = a.consume().unwrap();
    assert!(matches!(
        Server::new(ServerOpts::new(vec![a])).start().await,
        Err(StartError::Consume(_))
    ));
}

#[tokio::test]
async fn test_no_transports() {
    let handle = Server::new(ServerOpts::<LocalTransport>::default()).spawn();
    time::sleep(Duration::from_millis(10)).await;
    assert!(!handle.is_finished());
    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_closure_handler() {
    let a = LocalTransport::new("A");
    let c = LocalTransport::new("C");
    c.connect(&a).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = Server::with_handler(ServerOpts::new(vec![a.clone()]), move |rpc: Rpc| {
        let _ = tx.send(rpc.payload);
    })
    .spawn();

    c.send_message(a.addr(), Bytes::from_static(b"hi"))
        .await
        .unwrap();
    let payload = time::timeout(TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(&payload[..], b"hi");

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_dropping_handle_shuts_down() {
    let a = LocalTransport::new("A");
    let server = Server::new(ServerOpts::new(vec![a]));
    let shutdown = server.shutdown_signal();
    let handle = server.spawn();
    drop(handle);
    assert!(shutdown.is_shutdown());
}

#[tokio::test]
async fn test_join_returns_after_shutdown_signal() {
    let a = LocalTransport::new("A");
    let handle = Server::new(ServerOpts::new(vec![a])).spawn();
    let shutdown = handle.shutdown_signal();
    let join = tokio::spawn(handle.join());

    time::sleep(Duration::from_millis(10)).await;
    assert!(!join.is_finished());
    shutdown.shutdown();
    time::timeout(TIMEOUT, join).await.unwrap().unwrap().unwrap();
}
