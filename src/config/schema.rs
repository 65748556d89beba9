//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the stream
//! server. All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the virtual stream server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StreamConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Range serving and correlation settings.
    pub stream: StreamSettings,

    /// Peer socket settings.
    pub peer: PeerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// How correlation identifiers are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Short base-36 tokens.
    #[default]
    Random,
    /// UUID v4 strings.
    Uuid,
    /// Monotonic counter, handy for reading logs.
    Sequential,
}

/// Range serving and correlation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Path segment marking a virtual-resource request.
    pub route_marker: String,

    /// Largest window served by a single response.
    pub max_chunk_bytes: u64,

    /// How long a data request may wait for its peer, in milliseconds.
    pub exchange_timeout_ms: u64,

    /// Content-Type of partial responses.
    pub content_type: String,

    /// Correlation identifier source.
    pub id_strategy: IdStrategy,

    /// Interval of the expired-entry sweep, in milliseconds.
    pub reaper_interval_ms: u64,
}

impl StreamSettings {
    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange_timeout_ms)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            route_marker: "virtual-stream".to_string(),
            max_chunk_bytes: 1024 * 1024,
            exchange_timeout_ms: 15_000,
            content_type: "video/mp4".to_string(),
            id_strategy: IdStrategy::Random,
            reaper_interval_ms: 1_000,
        }
    }
}

/// Peer socket configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PeerConfig {
    /// WebSocket endpoint controlling clients connect to.
    pub path: String,

    /// Outbound message queue depth per peer.
    pub outbound_buffer: usize,

    /// Largest accepted inbound frame.
    pub max_frame_bytes: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            path: "/peer".to_string(),
            outbound_buffer: 64,
            max_frame_bytes: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Timeout configuration for HTTP requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log formatter.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus scrape address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    pub enabled: bool,
    /// Bearer token required on `/admin` routes.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
        }
    }
}
