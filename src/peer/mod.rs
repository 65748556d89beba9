//! Peer (controlling client) subsystem.
//!
//! # Data Flow
//! ```text
//! Peer ←──── WebSocket frames ────→ socket.rs
//!                                      ↑ outbound queue (registry.rs)
//!                                      ↓ fulfill (correlation table)
//! ```
//!
//! # Design Decisions
//! - Requests go out as JSON text, answers may be JSON or compact binary
//! - Undecodable frames are dropped without closing the session
//! - A disconnecting peer leaves its exchanges to time out

pub mod message;
pub mod registry;
pub mod socket;

pub use message::{DataMessage, FrameError, PeerReply};
pub use registry::{ClientType, PeerHandle, PeerId, PeerInfo, PeerRegistry};
pub use socket::serve_peer;
