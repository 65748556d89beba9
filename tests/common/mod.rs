//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Bytes;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use virtual_stream::config::{IdStrategy, StreamConfig};
use virtual_stream::http::AppState;
use virtual_stream::peer::{ClientType, DataMessage, PeerHandle};
use virtual_stream::{HttpServer, Shutdown};

/// Config with deterministic ids.
pub fn test_config() -> StreamConfig {
    let mut config = StreamConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.stream.id_strategy = IdStrategy::Sequential;
    config
}

/// Start a server on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_server(config: StreamConfig) -> (SocketAddr, Shutdown, AppState) {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, shutdown.clone());
    let state = server.state().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    (addr, shutdown, state)
}

/// Register an in-process window peer that answers every request with
/// `answer(start, end)`; `None` sends DATA_ERROR.
#[allow(dead_code)]
pub fn spawn_programmable_peer<F>(
    state: &AppState,
    answer: F,
) -> (PeerHandle, mpsc::UnboundedReceiver<DataMessage>)
where
    F: Fn(u64, u64) -> Option<Bytes> + Send + 'static,
{
    let (handle, mut rx) = state.peers.register(ClientType::Window, 16);
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    let table = state.table.clone();

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let _ = seen_tx.send(message.clone());
            if let DataMessage::RequestData {
                request_id,
                start,
                end,
                ..
            } = message
            {
                table.fulfill(&request_id, answer(start, end));
            }
        }
    });

    (handle, seen_rx)
}

/// Window-sized buffer of a repeating byte pattern.
#[allow(dead_code)]
pub fn pattern(start: u64, end: u64) -> Bytes {
    (start..=end).map(|i| (i % 251) as u8).collect::<Vec<u8>>().into()
}

/// Poll `check` until it holds or a second passes.
#[allow(dead_code)]
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
