//! Peer WebSocket upgrade.
//!
//! Controlling clients connect to `peer.path` with `?type=window` (the
//! default), `worker` or `sharedworker`. Only window clients are asked for
//! data.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use crate::http::server::AppState;
use crate::peer::{serve_peer, ClientType};

#[derive(Debug, Deserialize)]
pub struct PeerParams {
    #[serde(rename = "type", default)]
    pub client_type: ClientType,
}

pub async fn peer_socket_handler(
    State(state): State<AppState>,
    Query(params): Query<PeerParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let buffer = state.config.peer.outbound_buffer;
    let max_frame = state.config.peer.max_frame_bytes;
    let shutdown = state.shutdown.subscribe();
    let peers = state.peers.clone();
    let table = state.table.clone();

    ws.max_message_size(max_frame)
        .max_frame_size(max_frame)
        .on_upgrade(move |socket| {
            serve_peer(socket, params.client_type, peers, table, buffer, shutdown)
        })
}
