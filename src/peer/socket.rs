//! Peer WebSocket session.
//!
//! One task per connected peer multiplexes three things: outbound data
//! requests queued by the range responder, inbound answers routed to the
//! correlation table, and the shutdown signal.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::correlation::CorrelationTable;
use crate::observability::metrics;
use crate::peer::message::{parse_binary, parse_text, FrameError, PeerReply};
use crate::peer::registry::{ClientType, PeerId, PeerRegistry};

/// Drive a peer connection until it closes or the server shuts down.
pub async fn serve_peer(
    socket: WebSocket,
    client_type: ClientType,
    registry: PeerRegistry,
    table: CorrelationTable,
    outbound_buffer: usize,
    mut shutdown: broadcast::Receiver<()>,
) {
    let (handle, mut outbound) = registry.register(client_type, outbound_buffer);
    let peer = handle.id();
    // Only the registry holds a sender from here on.
    drop(handle);
    metrics::record_peers(registry.len());
    tracing::info!(peer = %peer, client_type = ?client_type, "Peer connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            Some(message) = outbound.recv() => {
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(peer = %peer, error = %e, "Failed to encode data request");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::warn!(peer = %peer, error = %e, "Peer send failed, closing session");
                    break;
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch(peer, &table, parse_text(text.as_str())),
                Some(Ok(Message::Binary(data))) => dispatch(peer, &table, parse_binary(data)),
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong is answered by the socket itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(peer = %peer, error = %e, "Peer socket error");
                    break;
                }
            },
            _ = shutdown.recv() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }

    registry.unregister(peer);
    metrics::record_peers(registry.len());
    tracing::info!(peer = %peer, "Peer disconnected");
}

fn dispatch(peer: PeerId, table: &CorrelationTable, reply: Result<PeerReply, FrameError>) {
    match reply {
        Ok(reply) => {
            let (request_id, value) = reply.into_parts();
            if !table.fulfill(&request_id, value) {
                tracing::debug!(peer = %peer, exchange_id = %request_id, "Late or unknown answer dropped");
            }
        }
        Err(e) => {
            tracing::warn!(peer = %peer, error = %e, "Dropping undecodable peer frame");
        }
    }
}
