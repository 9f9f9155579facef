use async_trait::async_trait;
use framelink::rpc::{ClientConfig, ClientEvent, CodecError, MessageCodec, RpcFrame, RpcFrameCodec};
use framelink::transport::{InboundChunk, RawDuplex, TransportError};
use framelink_tokio_client::{ConnEvent, Connector, TokioRpcClient};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

/// Pass-through codec: the payload bytes are the value.
struct RawCodec;

impl MessageCodec for RawCodec {
    type Value = Vec<u8>;

    fn encode(&self, _route: &str, value: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(value.clone())
    }

    fn decode(&self, _route: &str, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(payload.to_vec())
    }
}

/// The far side of one mock connection, handed to the test when the client
/// connects.
struct Peer {
    from_client: mpsc::UnboundedReceiver<Vec<u8>>,
    to_client: mpsc::UnboundedSender<ConnEvent>,
    closed: Arc<AtomicBool>,
}

impl Peer {
    async fn recv_frame(&mut self) -> RpcFrame {
        let bytes = timeout(Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("client hung up");
        RpcFrameCodec::decode(&bytes).expect("client sent a malformed frame")
    }

    fn send_frame(&self, frame: &RpcFrame) {
        let bytes = RpcFrameCodec::encode(frame).unwrap();
        self.to_client
            .send(ConnEvent::Message(InboundChunk::Binary(bytes)))
            .unwrap();
    }
}

struct MockConn {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    closed: Arc<AtomicBool>,
}

impl RawDuplex for MockConn {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|e| TransportError::SendFailure(e.to_string()))
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// In-process connector: every successful connect hands the test a `Peer`
/// through `peer_tx`.
struct MockConnector {
    peer_tx: mpsc::UnboundedSender<Peer>,
    attempts: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
}

impl MockConnector {
    fn new() -> (Self, mpsc::UnboundedReceiver<Peer>) {
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        (
            Self {
                peer_tx,
                attempts: Arc::new(AtomicUsize::new(0)),
                refuse: Arc::new(AtomicBool::new(false)),
            },
            peer_rx,
        )
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Conn = MockConn;

    async fn connect(
        &mut self,
        _url: &str,
    ) -> Result<(MockConn, mpsc::UnboundedReceiver<ConnEvent>), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionFailure(
                "connection refused".to_string(),
            ));
        }
        let (tx, from_client) = mpsc::unbounded_channel();
        let (to_client, conn_events) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let _ = to_client.send(ConnEvent::Open);
        let _ = self.peer_tx.send(Peer {
            from_client,
            to_client: to_client.clone(),
            closed: closed.clone(),
        });
        Ok((MockConn { tx, closed }, conn_events))
    }
}

async fn next_event<V>(events: &mut mpsc::UnboundedReceiver<ClientEvent<V>>) -> ClientEvent<V> {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event stream closed")
}

async fn next_peer(peer_rx: &mut mpsc::UnboundedReceiver<Peer>) -> Peer {
    timeout(Duration::from_secs(5), peer_rx.recv())
        .await
        .expect("timed out waiting for a connection")
        .expect("connector dropped")
}

#[tokio::test]
async fn request_reply_round_trip() {
    let (connector, mut peer_rx) = MockConnector::new();
    let (client, mut events) =
        TokioRpcClient::new(RawCodec, ClientConfig::default(), connector);

    client.connect("127.0.0.1", 8101);
    let mut peer = next_peer(&mut peer_rx).await;
    assert!(matches!(next_event(&mut events).await, ClientEvent::Open));

    let responder = tokio::spawn(async move {
        let frame = peer.recv_frame().await;
        assert_eq!(frame.route, "Echo");
        assert_eq!(frame.payload, vec![1, 2, 3]);
        assert_eq!(frame.request_id, 1);
        peer.send_frame(&RpcFrame {
            route: frame.route,
            payload: vec![9, 9],
            request_id: frame.request_id,
        });
    });

    let reply = timeout(
        Duration::from_secs(5),
        client.request("Echo", vec![1, 2, 3]),
    )
    .await
    .expect("request never resolved");
    assert_eq!(reply, Some(vec![9, 9]));
    responder.await.unwrap();
}

#[tokio::test]
async fn notify_goes_out_with_id_zero() {
    let (connector, mut peer_rx) = MockConnector::new();
    let (client, mut events) =
        TokioRpcClient::new(RawCodec, ClientConfig::default(), connector);

    client.connect("127.0.0.1", 8101);
    let mut peer = next_peer(&mut peer_rx).await;
    assert!(matches!(next_event(&mut events).await, ClientEvent::Open));

    client.notify("Log", vec![42]);
    let frame = peer.recv_frame().await;
    assert_eq!(frame.route, "Log");
    assert_eq!(frame.request_id, 0);
    assert_eq!(frame.payload, vec![42]);
}

#[tokio::test]
async fn pushes_reach_the_event_stream() {
    let (connector, mut peer_rx) = MockConnector::new();
    let (client, mut events) =
        TokioRpcClient::new(RawCodec, ClientConfig::default(), connector);

    client.connect_by_url("ws://127.0.0.1:8101");
    let peer = next_peer(&mut peer_rx).await;
    assert!(matches!(next_event(&mut events).await, ClientEvent::Open));

    peer.send_frame(&RpcFrame {
        route: "Tick".to_string(),
        payload: vec![5],
        request_id: 0,
    });

    match next_event(&mut events).await {
        ClientEvent::Push { route, payload } => {
            assert_eq!(route, "Tick");
            assert_eq!(payload, vec![5]);
        }
        other => panic!("expected a push, got {:?}", other),
    }
}

#[tokio::test]
async fn silent_peer_triggers_a_heartbeat_timeout() {
    let (connector, mut peer_rx) = MockConnector::new();
    let config = ClientConfig {
        heartbeat_interval: 40,
        heartbeat_timeout: 80,
        gap_threshold: 10,
        ..ClientConfig::default()
    };
    let (client, mut events) = TokioRpcClient::new(RawCodec, config, connector);

    client.connect("127.0.0.1", 8101);
    let mut peer = next_peer(&mut peer_rx).await;
    assert!(matches!(next_event(&mut events).await, ClientEvent::Open));

    client.heartbeat();

    // The probe goes out and nobody answers.
    let probe = peer.recv_frame().await;
    assert_eq!(probe.route, "HeartbeatRequest");
    assert_eq!(probe.request_id, 0);
    assert!(probe.payload.is_empty());

    loop {
        if matches!(next_event(&mut events).await, ClientEvent::HeartbeatTimeout) {
            break;
        }
    }

    // Teardown follows the event within the same loop iteration.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(peer.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn replies_keep_the_heartbeat_alive() {
    let (connector, mut peer_rx) = MockConnector::new();
    let config = ClientConfig {
        heartbeat_interval: 30,
        heartbeat_timeout: 60,
        gap_threshold: 10,
        ..ClientConfig::default()
    };
    let (client, mut events) = TokioRpcClient::new(RawCodec, config, connector);

    client.connect("127.0.0.1", 8101);
    let mut peer = next_peer(&mut peer_rx).await;
    assert!(matches!(next_event(&mut events).await, ClientEvent::Open));

    client.heartbeat();

    // Answer a few probes; the watchdog must stay quiet the whole time.
    for _ in 0..3 {
        let probe = peer.recv_frame().await;
        peer.send_frame(&RpcFrame {
            route: probe.route,
            payload: Vec::new(),
            request_id: 0,
        });
        client.heartbeat();
    }

    // Replies with ID 0 surface as pushes; no timeout may be among them.
    tokio::time::sleep(Duration::from_millis(100)).await;
    while let Ok(ev) = events.try_recv() {
        assert!(
            !matches!(ev, ClientEvent::HeartbeatTimeout),
            "watchdog fired despite live traffic"
        );
    }
    assert!(!peer.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn server_close_triggers_reconnect() {
    let (connector, mut peer_rx) = MockConnector::new();
    let attempts = connector.attempts.clone();
    let config = ClientConfig {
        reconnect_delay: 20,
        reconnect: true,
        ..ClientConfig::default()
    };
    let (client, mut events) = TokioRpcClient::new(RawCodec, config, connector);

    client.connect("127.0.0.1", 8101);
    let first = next_peer(&mut peer_rx).await;
    assert!(matches!(next_event(&mut events).await, ClientEvent::Open));

    // Server drops the connection.
    first.to_client.send(ConnEvent::Closed).unwrap();
    assert!(matches!(next_event(&mut events).await, ClientEvent::Close));
    assert!(matches!(
        next_event(&mut events).await,
        ClientEvent::Disconnect
    ));

    // A second connection is dialed and reported as a reconnect.
    let _second = next_peer(&mut peer_rx).await;
    assert!(matches!(
        next_event(&mut events).await,
        ClientEvent::Reconnect
    ));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn connect_failures_stop_at_the_attempt_budget() {
    let (connector, _peer_rx) = MockConnector::new();
    let attempts = connector.attempts.clone();
    connector.refuse.store(true, Ordering::SeqCst);
    let config = ClientConfig {
        reconnect_delay: 10,
        max_reconnect_attempts: 3,
        reconnect: true,
        ..ClientConfig::default()
    };
    let (client, mut events) = TokioRpcClient::new(RawCodec, config, connector);

    client.connect("127.0.0.1", 8101);

    // Initial dial plus three budgeted retries (10 + 20 + 40 ms of backoff).
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 4);

    let mut errors = 0;
    while let Ok(ev) = events.try_recv() {
        if matches!(ev, ClientEvent::Error(_)) {
            errors += 1;
        }
    }
    assert_eq!(errors, 4);
}

mod schema_codec {
    use super::*;

    #[derive(bitcode::Encode, bitcode::Decode, Debug, Clone, PartialEq)]
    struct Seat {
        table: u32,
        position: u8,
    }

    struct SeatCodec;

    impl MessageCodec for SeatCodec {
        type Value = Seat;

        fn encode(&self, _route: &str, value: &Seat) -> Result<Vec<u8>, CodecError> {
            Ok(bitcode::encode(value))
        }

        fn decode(&self, _route: &str, payload: &[u8]) -> Result<Seat, CodecError> {
            bitcode::decode(payload).map_err(|e| CodecError::Decode(e.to_string()))
        }
    }

    #[tokio::test]
    async fn structured_values_round_trip_through_the_event_loop() {
        let (connector, mut peer_rx) = MockConnector::new();
        let (client, mut events) =
            TokioRpcClient::new(SeatCodec, ClientConfig::default(), connector);

        client.connect("127.0.0.1", 8101);
        let mut peer = next_peer(&mut peer_rx).await;
        assert!(matches!(next_event(&mut events).await, ClientEvent::Open));

        // Echo the encoded payload back under the same correlation ID.
        let responder = tokio::spawn(async move {
            let frame = peer.recv_frame().await;
            assert_eq!(frame.route, "TakeSeat");
            assert_eq!(frame.request_id, 1);
            peer.send_frame(&RpcFrame {
                route: frame.route,
                payload: frame.payload,
                request_id: frame.request_id,
            });
        });

        let reply = timeout(
            Duration::from_secs(5),
            client.request(
                "TakeSeat",
                Seat {
                    table: 7,
                    position: 3,
                },
            ),
        )
        .await
        .expect("request never resolved");
        assert_eq!(
            reply,
            Some(Seat {
                table: 7,
                position: 3
            })
        );
        responder.await.unwrap();
    }
}

#[tokio::test]
async fn disconnect_without_reconnect_stays_down() {
    let (connector, mut peer_rx) = MockConnector::new();
    let attempts = connector.attempts.clone();
    let (client, mut events) =
        TokioRpcClient::new(RawCodec, ClientConfig::default(), connector);

    client.connect("127.0.0.1", 8101);
    let peer = next_peer(&mut peer_rx).await;
    assert!(matches!(next_event(&mut events).await, ClientEvent::Open));

    client.disconnect();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(peer.closed.load(Ordering::SeqCst));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
