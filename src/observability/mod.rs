//! Logs and metrics.
//!
//! ```text
//! http, responder, peer sessions, reaper
//!     → logging.rs   tracing events, pretty or JSON on stdout
//!     → metrics.rs   stream_* counters and gauges
//!                    scraped from the Prometheus listener
//! ```
//!
//! `request_id`, `exchange_id` and `peer` are the fields that tie an HTTP
//! request to the peer exchange that served it.

pub mod logging;
pub mod metrics;
