//! Virtual stream serving subsystem.
//!
//! # Data Flow
//! ```text
//! GET .../virtual-stream/{resource_id}/{total_size}
//!     → target.rs (path → StreamTarget)
//!     → range.rs (Range header → clamped ByteRange)
//!     → responder.rs (peer exchange via the correlation table)
//!     → http/response.rs (206 / 416 / 500)
//! ```

pub mod range;
pub mod responder;
pub mod target;

pub use range::{resolve_window, ByteRange, Unsatisfiable};
pub use responder::RangeResponder;
pub use target::{StreamTarget, TargetError};
