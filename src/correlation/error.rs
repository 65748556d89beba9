use thiserror::Error;

/// Why a data exchange produced no bytes.
///
/// Every variant becomes the same HTTP 500 at the boundary; the distinction
/// only feeds logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("no controlling client connected")]
    NoPeer,

    #[error("peer reported an error")]
    PeerReported,

    #[error("peer did not answer before the deadline")]
    TimedOut,

    #[error("peer connection closed before the request was sent")]
    PeerUnreachable,
}

impl ExchangeError {
    /// Metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeError::NoPeer => "no_peer",
            ExchangeError::PeerReported => "peer_error",
            ExchangeError::TimedOut => "timed_out",
            ExchangeError::PeerUnreachable => "peer_unreachable",
        }
    }
}
