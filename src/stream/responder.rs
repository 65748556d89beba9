//! Range fulfillment.
//!
//! # States
//! ```text
//! PARSED → AWAITING_PEER → FULFILLED  ─┐
//!    │            ├──────→ PEER_ERROR ─┤
//!    │            └──────→ TIMED_OUT  ─┼→ RESPONDED
//!    └───────────────────→ NO_PEER    ─┘
//! ```
//! No retries and no cycles; every path ends in exactly one response.

use axum::body::Bytes;
use axum::http::HeaderValue;
use axum::response::Response;
use tokio::time;

use crate::config::StreamSettings;
use crate::correlation::{CorrelationTable, ExchangeError};
use crate::http::response;
use crate::observability::metrics;
use crate::peer::{DataMessage, PeerRegistry};
use crate::stream::range::{resolve_window, ByteRange};
use crate::stream::target::StreamTarget;

/// Turns stream requests into peer exchanges and HTTP responses.
#[derive(Debug, Clone)]
pub struct RangeResponder {
    table: CorrelationTable,
    peers: PeerRegistry,
    max_chunk: u64,
    content_type: HeaderValue,
}

impl RangeResponder {
    pub fn new(table: CorrelationTable, peers: PeerRegistry, settings: &StreamSettings) -> Self {
        let content_type = HeaderValue::from_str(&settings.content_type).unwrap_or_else(|_| {
            tracing::warn!(content_type = %settings.content_type, "Invalid content type, using video/mp4");
            HeaderValue::from_static("video/mp4")
        });
        Self {
            table,
            peers,
            max_chunk: settings.max_chunk_bytes,
            content_type,
        }
    }

    /// Serve one stream request.
    pub async fn handle(&self, target: &StreamTarget, range_header: Option<&str>) -> Response {
        let Ok(window) = resolve_window(range_header, target.total_size, self.max_chunk) else {
            tracing::debug!(
                resource_id = %target.resource_id,
                range = ?range_header,
                total = target.total_size,
                "Range not satisfiable"
            );
            return response::range_not_satisfiable(target.total_size);
        };

        match self.fetch(target, window).await {
            Ok(chunk) => match fit_chunk(chunk, window) {
                Some((chunk, served)) => {
                    metrics::record_exchange("fulfilled");
                    metrics::record_bytes_served(chunk.len());
                    tracing::debug!(
                        resource_id = %target.resource_id,
                        start = served.start,
                        end = served.end,
                        bytes = chunk.len(),
                        "Range fulfilled"
                    );
                    response::partial_content(chunk, served, target.total_size, &self.content_type)
                }
                None => {
                    metrics::record_exchange("empty");
                    tracing::warn!(resource_id = %target.resource_id, "Peer answered with an empty chunk");
                    response::exchange_failed()
                }
            },
            Err(e) => {
                metrics::record_exchange(e.as_str());
                tracing::warn!(
                    resource_id = %target.resource_id,
                    start = window.start,
                    end = window.end,
                    error = %e,
                    "Range fetch failed"
                );
                response::exchange_failed()
            }
        }
    }

    /// Headers a GET would carry for the resolved window, without asking the
    /// peer. Content-Length is the window length; a peer that later answers
    /// short would make a GET differ.
    pub fn head(&self, target: &StreamTarget, range_header: Option<&str>) -> Response {
        match resolve_window(range_header, target.total_size, self.max_chunk) {
            Ok(window) => response::partial_content_head(window, target.total_size, &self.content_type),
            Err(_) => response::range_not_satisfiable(target.total_size),
        }
    }

    /// Ask the controlling peer for `window` of the target resource.
    pub async fn fetch(&self, target: &StreamTarget, window: ByteRange) -> Result<Bytes, ExchangeError> {
        // No peer: fail before opening an entry that would only time out.
        let peer = self.peers.controlling_peer().ok_or(ExchangeError::NoPeer)?;

        let (id, completion) = self.table.open();
        let message = DataMessage::RequestData {
            request_id: id.clone(),
            start: window.start,
            end: window.end,
            file_id: target.resource_id.clone(),
        };

        tracing::debug!(
            exchange_id = %id,
            peer = %peer.id(),
            resource_id = %target.resource_id,
            start = window.start,
            end = window.end,
            "Requesting data from peer"
        );

        // A full queue counts against the exchange deadline too.
        match time::timeout_at(completion.deadline(), peer.send(message)).await {
            Ok(Ok(())) => completion.wait().await,
            Ok(Err(e)) => {
                self.table.discard(&id);
                Err(e)
            }
            Err(_) => {
                tracing::debug!(exchange_id = %id, peer = %peer.id(), "Peer queue stayed full until the deadline");
                self.table.expire(&id);
                Err(ExchangeError::TimedOut)
            }
        }
    }
}

/// Make the served window agree with the bytes received: longer chunks are
/// cut to the window, shorter ones shrink it. `None` for an empty chunk.
fn fit_chunk(chunk: Bytes, window: ByteRange) -> Option<(Bytes, ByteRange)> {
    let len = chunk.len() as u64;
    if len == 0 {
        return None;
    }
    if len >= window.len() {
        let chunk = chunk.slice(..window.len() as usize);
        return Some((chunk, window));
    }
    let served = ByteRange {
        start: window.start,
        end: window.start + len - 1,
    };
    Some((chunk, served))
}
