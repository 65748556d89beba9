//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and cross-field rules.
//! Every problem is reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::StreamConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("stream.route_marker must be a single non-empty path segment, got '{0}'")]
    InvalidMarker(String),

    #[error("peer.path must start with '/', got '{0}'")]
    InvalidPeerPath(String),

    #[error("timeouts.request_secs ({request_secs}s) must exceed stream.exchange_timeout_ms ({exchange_ms}ms)")]
    RequestTimeoutTooShort { request_secs: u64, exchange_ms: u64 },

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &StreamConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let stream = &config.stream;
    if stream.max_chunk_bytes == 0 {
        errors.push(ValidationError::Zero("stream.max_chunk_bytes"));
    }
    if stream.exchange_timeout_ms == 0 {
        errors.push(ValidationError::Zero("stream.exchange_timeout_ms"));
    }
    if stream.reaper_interval_ms == 0 {
        errors.push(ValidationError::Zero("stream.reaper_interval_ms"));
    }
    if stream.route_marker.is_empty() || stream.route_marker.contains('/') {
        errors.push(ValidationError::InvalidMarker(stream.route_marker.clone()));
    }

    if !config.peer.path.starts_with('/') {
        errors.push(ValidationError::InvalidPeerPath(config.peer.path.clone()));
    }
    if config.peer.outbound_buffer == 0 {
        errors.push(ValidationError::Zero("peer.outbound_buffer"));
    }
    if config.peer.max_frame_bytes == 0 {
        errors.push(ValidationError::Zero("peer.max_frame_bytes"));
    }

    // The HTTP timeout must not cut an exchange short.
    if config.timeouts.request_secs.saturating_mul(1000) <= stream.exchange_timeout_ms {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_secs: config.timeouts.request_secs,
            exchange_ms: stream.exchange_timeout_ms,
        });
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::MissingAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
