//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch virtual-stream paths to the range responder
//! - Accept peer WebSocket connections
//! - Run the exchange reaper alongside the server

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::config::StreamConfig;
use crate::correlation::{generator_for, run_reaper, CorrelationTable};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::websocket::peer_socket_handler;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::peer::PeerRegistry;
use crate::stream::{RangeResponder, StreamTarget};

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<StreamConfig>,
    pub table: CorrelationTable,
    pub peers: PeerRegistry,
    pub responder: RangeResponder,
    pub shutdown: Shutdown,
}

impl AppState {
    pub fn new(config: StreamConfig, shutdown: Shutdown) -> Self {
        let table = CorrelationTable::new(
            config.stream.exchange_timeout(),
            generator_for(config.stream.id_strategy),
        );
        let peers = PeerRegistry::new();
        let responder = RangeResponder::new(table.clone(), peers.clone(), &config.stream);

        Self {
            config: Arc::new(config),
            table,
            peers,
            responder,
            shutdown,
        }
    }
}

/// HTTP server for virtual streams.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: StreamConfig, shutdown: Shutdown) -> Self {
        let state = AppState::new(config, shutdown);
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        let mut router = Router::new()
            .route("/health", get(health))
            .route(&config.peer.path, get(peer_socket_handler))
            .fallback(stream_handler);

        if config.admin.enabled {
            router = router.merge(admin::setup_admin_router(state.clone()));
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener until
    /// shutdown is triggered.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            peer_path = %self.state.config.peer.path,
            "HTTP server starting"
        );

        let reaper = tokio::spawn(run_reaper(
            self.state.table.clone(),
            self.state.config.stream.reaper_interval(),
            self.state.shutdown.subscribe(),
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(self.state.shutdown.signalled())
            .await?;

        // The reaper saw the same signal.
        let _ = reaper.await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Serve a virtual-stream path; everything else is 404.
async fn stream_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers).to_string();
    let path = uri.path();

    let response = match StreamTarget::from_path(path, &state.config.stream.route_marker) {
        Ok(None) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Malformed stream path");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Ok(Some(_)) if method != Method::GET && method != Method::HEAD => {
            (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, HEAD")]).into_response()
        }
        Ok(Some(target)) => {
            let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
            tracing::debug!(
                request_id = %request_id,
                resource_id = %target.resource_id,
                total = target.total_size,
                range = ?range,
                "Stream request"
            );
            if method == Method::HEAD {
                state.responder.head(&target, range)
            } else {
                state.responder.handle(&target, range).await
            }
        }
    };

    metrics::record_request(response.status().as_u16(), start_time);
    response
}
