//! Request correlation subsystem.
//!
//! # Data Flow
//! ```text
//! Range responder
//!     → table.rs open() (fresh id from id.rs, deadline armed)
//!     → REQUEST_DATA sent to the peer with that id
//!     → Completion::wait() suspends
//!
//! Peer socket reader
//!     → DATA_RESPONSE / DATA_ERROR
//!     → table.rs fulfill(id) (no-op for unknown ids)
//!     → waiter resumes with bytes or ExchangeError
//!
//! Deadline passes
//!     → waiter's timeout or the reaper expires the entry
//! ```

pub mod error;
pub mod id;
pub mod table;

pub use error::ExchangeError;
pub use id::{
    generator_for, IdGenerator, RandomIdGenerator, RequestId, SequentialIdGenerator,
    UuidIdGenerator,
};
pub use table::{run_reaper, Completion, CorrelationTable};
