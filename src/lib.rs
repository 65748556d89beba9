//! Virtual stream server library.
//!
//! Serves HTTP range requests for virtual resources whose bytes come from a
//! controlling client connected over WebSocket.

pub mod admin;
pub mod config;
pub mod correlation;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod peer;
pub mod stream;

pub use config::StreamConfig;
pub use correlation::CorrelationTable;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use stream::RangeResponder;
