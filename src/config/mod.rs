//! Server configuration.
//!
//! ```text
//! TOML file ─ loader.rs ─▶ StreamConfig ─ validation.rs ─▶ Arc<StreamConfig>
//! ```
//!
//! Every section has defaults, so an empty file (or no file) is a working
//! config. Serde rejects malformed values; `validate_config` rejects
//! combinations that parse but cannot work, such as an exchange timeout
//! longer than the request timeout. Changes need a restart.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, IdStrategy, ListenerConfig, LogFormat, ObservabilityConfig, PeerConfig,
    StreamConfig, StreamSettings, TimeoutConfig,
};
pub use validation::ValidationError;
