//! Integration tests for the full relay flow over real streams.

use bluzone_relay::events::EventProcessor;
use bluzone_relay::relay::{CloseCause, InboundEvent, RelayError, RelayState, StreamRelay};
use bluzone_relay::state::{ConnectionStatus, SessionState};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn next_event(rx: &mut mpsc::UnboundedReceiver<InboundEvent>) -> InboundEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Collect `DataReceived` payloads until `expected` bytes have arrived.
async fn collect_received(
    rx: &mut mpsc::UnboundedReceiver<InboundEvent>,
    expected: usize,
) -> Vec<u8> {
    let mut received = Vec::new();
    while received.len() < expected {
        match next_event(rx).await {
            InboundEvent::DataReceived { bytes, length } => {
                assert_eq!(bytes.len(), length);
                received.extend_from_slice(&bytes);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
    received
}

#[tokio::test]
async fn test_duplex_round_trip() {
    let (local, mut remote) = tokio::io::duplex(4096);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let relay = StreamRelay::new(local, tx).unwrap();
    relay.start().unwrap();

    remote.write_all(&[0x41, 0x42]).await.unwrap();
    assert_eq!(collect_received(&mut rx, 2).await, vec![0x41, 0x42]);

    relay.send(b"unlock").await.unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        InboundEvent::DataSent {
            bytes: b"unlock".to_vec()
        }
    );
    let mut buf = [0u8; 6];
    remote.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"unlock");

    relay.close().await;
    assert_eq!(
        next_event(&mut rx).await,
        InboundEvent::Closed {
            cause: CloseCause::Requested
        }
    );
}

#[tokio::test]
async fn test_large_inbound_is_chunked_by_buffer() {
    let (local, mut remote) = tokio::io::duplex(8192);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let relay = StreamRelay::new(local, tx).unwrap();
    relay.start().unwrap();

    let payload: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
    remote.write_all(&payload).await.unwrap();

    let mut received = Vec::new();
    while received.len() < payload.len() {
        match next_event(&mut rx).await {
            InboundEvent::DataReceived { bytes, length } => {
                assert!(length <= 1024);
                received.extend_from_slice(&bytes);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
    assert_eq!(received, payload);

    relay.close().await;
}

#[tokio::test]
async fn test_remote_drop_closes_relay() {
    let (local, remote) = tokio::io::duplex(64);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let relay = StreamRelay::new(local, tx).unwrap();
    let handle = relay.start().unwrap();

    drop(remote);

    assert_eq!(
        next_event(&mut rx).await,
        InboundEvent::Closed {
            cause: CloseCause::PeerClosed
        }
    );
    timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert_eq!(relay.state(), RelayState::Closed);
    assert!(matches!(relay.send(b"late").await, Err(RelayError::Closed)));
}

#[tokio::test]
async fn test_tcp_session_with_processor() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let client = tokio::net::TcpStream::connect(addr).await.unwrap();
    let (mut server, _) = listener.accept().await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let relay = StreamRelay::new(client, tx).unwrap();
    assert_eq!(relay.peer(), addr.to_string());

    let state = SessionState::new();
    state.set_connected(relay.peer().to_string());
    let mut processor = EventProcessor::new(state.clone(), Vec::new(), Vec::new());

    relay.start().unwrap();
    relay.send(b"LOCK\n").await.unwrap();

    let mut buf = [0u8; 5];
    server.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"LOCK\n");

    server.write_all(b"OK\n").await.unwrap();
    drop(server);

    loop {
        let event = next_event(&mut rx).await;
        if !processor.process_event(event).unwrap() {
            break;
        }
    }

    assert_eq!(processor.output(), b"OK\n");
    let counters = state.get_counters();
    assert_eq!(counters.bytes_sent, 5);
    assert_eq!(counters.bytes_received, 3);
    assert_eq!(state.get_status(), ConnectionStatus::Disconnected);
    assert_eq!(state.get_close_cause(), Some(CloseCause::PeerClosed));
}

#[tokio::test]
async fn test_concurrent_senders() {
    let (local, mut remote) = tokio::io::duplex(1 << 16);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let relay = StreamRelay::new(local, tx).unwrap();
    relay.start().unwrap();

    let mut tasks = Vec::new();
    for i in 0..8u8 {
        let relay = relay.clone();
        tasks.push(tokio::spawn(async move {
            relay.send(&[i; 16]).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mut sent = 0;
    for _ in 0..8 {
        match next_event(&mut rx).await {
            InboundEvent::DataSent { bytes } => {
                assert_eq!(bytes.len(), 16);
                assert!(bytes.iter().all(|b| *b == bytes[0]));
                sent += bytes.len();
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
    assert_eq!(sent, 128);

    // Writes are serialized: each 16-byte chunk arrives contiguous.
    let mut buf = vec![0u8; 128];
    remote.read_exact(&mut buf).await.unwrap();
    for chunk in buf.chunks(16) {
        assert!(chunk.iter().all(|b| *b == chunk[0]));
    }

    relay.close().await;
}
