use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::peer::PeerInfo;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub pending_exchanges: usize,
    pub exchange_timeout_ms: u64,
    pub connected_peers: usize,
    /// False when no window client is connected; every stream request
    /// fails until one is.
    pub has_controlling_peer: bool,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        pending_exchanges: state.table.len(),
        exchange_timeout_ms: state.table.timeout().as_millis() as u64,
        connected_peers: state.peers.len(),
        has_controlling_peer: state.peers.controlling_peer().is_some(),
    })
}

pub async fn get_peers(State(state): State<AppState>) -> Json<Vec<PeerInfo>> {
    Json(state.peers.snapshot())
}
