//! Pending data requests keyed by correlation id.
//!
//! # Responsibilities
//! - Hand out fresh ids together with a waitable completion
//! - Route inbound responses to the matching waiter, once
//! - Fail and forget entries whose deadline has passed
//!
//! # Design Decisions
//! - Every path that settles an entry removes it from the map first and only
//!   then writes to its oneshot; whoever removes it owns the only sender
//! - Deadlines are absolute `tokio::time::Instant`s, so paused test clocks
//!   drive expiry deterministically
//! - Two expiry paths: the waiter's own `timeout_at`, and the reaper for
//!   entries whose waiter was dropped

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{broadcast, oneshot};
use tokio::time::{self, Instant};

use crate::correlation::error::ExchangeError;
use crate::correlation::id::{IdGenerator, RequestId};
use crate::observability::metrics;

/// How an entry was settled.
#[derive(Debug)]
enum Settlement {
    Data(Bytes),
    /// The peer answered with DATA_ERROR.
    Rejected,
    /// The deadline passed first.
    Expired,
}

#[derive(Debug)]
struct PendingEntry {
    slot: oneshot::Sender<Settlement>,
    deadline: Instant,
}

/// Table of in-flight data requests.
///
/// Cheap to clone; clones share the same entries.
#[derive(Debug, Clone)]
pub struct CorrelationTable {
    entries: Arc<DashMap<RequestId, PendingEntry>>,
    ids: Arc<dyn IdGenerator>,
    timeout: Duration,
}

impl CorrelationTable {
    /// Create an empty table whose entries live for `timeout`.
    pub fn new(timeout: Duration, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ids,
            timeout,
        }
    }

    /// Open a pending entry under a fresh id.
    pub fn open(&self) -> (RequestId, Completion) {
        let (tx, rx) = oneshot::channel();
        let deadline = Instant::now() + self.timeout;
        let mut entry = Some(PendingEntry { slot: tx, deadline });

        let id = loop {
            let candidate = self.ids.next_id();
            match self.entries.entry(candidate.clone()) {
                Entry::Occupied(_) => {
                    tracing::trace!(exchange_id = %candidate, "Correlation id collision, regenerating");
                }
                Entry::Vacant(slot) => {
                    if let Some(pending) = entry.take() {
                        slot.insert(pending);
                    }
                    break candidate;
                }
            }
        };

        metrics::record_pending(self.entries.len());
        tracing::debug!(exchange_id = %id, timeout_ms = self.timeout.as_millis() as u64, "Exchange opened");

        let completion = Completion {
            id: id.clone(),
            deadline,
            rx,
            table: self.clone(),
        };
        (id, completion)
    }

    /// Resolve the entry for `id` with `value`, `None` meaning the peer
    /// reported an error.
    ///
    /// Unknown ids (already settled or expired) are ignored. Returns whether
    /// an entry was settled.
    pub fn fulfill(&self, id: &RequestId, value: Option<Bytes>) -> bool {
        let settlement = match value {
            Some(bytes) => Settlement::Data(bytes),
            None => Settlement::Rejected,
        };
        self.settle(id, settlement)
    }

    /// Fail the entry for `id` as timed out.
    pub fn expire(&self, id: &RequestId) -> bool {
        self.settle(id, Settlement::Expired)
    }

    /// Remove the entry for `id` without resolving it.
    pub fn discard(&self, id: &RequestId) -> bool {
        let removed = self.entries.remove(id).is_some();
        if removed {
            metrics::record_pending(self.entries.len());
            tracing::debug!(exchange_id = %id, "Exchange discarded");
        }
        removed
    }

    /// Expire every entry whose deadline is at or before `now`.
    ///
    /// Returns the number of entries expired.
    pub fn reap_expired(&self, now: Instant) -> usize {
        let overdue: Vec<RequestId> = self
            .entries
            .iter()
            .filter(|e| e.value().deadline <= now)
            .map(|e| e.key().clone())
            .collect();

        let mut reaped = 0;
        for id in overdue {
            // Re-check under the shard lock, the entry may have been settled
            // since the scan.
            if let Some((id, entry)) = self.entries.remove_if(&id, |_, e| e.deadline <= now) {
                let _ = entry.slot.send(Settlement::Expired);
                tracing::debug!(exchange_id = %id, "Exchange reaped after deadline");
                reaped += 1;
            }
        }

        if reaped > 0 {
            metrics::record_pending(self.entries.len());
        }
        reaped
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.contains_key(id)
    }

    /// Lifetime of each entry.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn settle(&self, id: &RequestId, settlement: Settlement) -> bool {
        let Some((_, entry)) = self.entries.remove(id) else {
            tracing::trace!(exchange_id = %id, "No pending exchange, dropping message");
            return false;
        };
        metrics::record_pending(self.entries.len());

        tracing::debug!(
            exchange_id = %id,
            outcome = settlement.label(),
            "Exchange settled"
        );
        // The waiter may have been dropped; nothing left to notify then.
        let _ = entry.slot.send(settlement);
        true
    }
}

impl Settlement {
    fn label(&self) -> &'static str {
        match self {
            Settlement::Data(_) => "data",
            Settlement::Rejected => "rejected",
            Settlement::Expired => "expired",
        }
    }
}

/// Waitable side of a pending entry.
#[derive(Debug)]
pub struct Completion {
    id: RequestId,
    deadline: Instant,
    rx: oneshot::Receiver<Settlement>,
    table: CorrelationTable,
}

impl Completion {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Wait for the peer's answer or the deadline, whichever comes first.
    pub async fn wait(mut self) -> Result<Bytes, ExchangeError> {
        let settlement = match time::timeout_at(self.deadline, &mut self.rx).await {
            Ok(Ok(settlement)) => settlement,
            // Sender dropped without a value: the entry was discarded.
            Ok(Err(_)) => Settlement::Expired,
            Err(_) => {
                // A response may land between the timer firing and this
                // expire; if so expire is a no-op and the value is waiting.
                self.table.expire(&self.id);
                self.rx.try_recv().unwrap_or(Settlement::Expired)
            }
        };

        match settlement {
            Settlement::Data(bytes) => Ok(bytes),
            Settlement::Rejected => Err(ExchangeError::PeerReported),
            Settlement::Expired => Err(ExchangeError::TimedOut),
        }
    }
}

/// Periodically expire overdue entries until shutdown.
pub async fn run_reaper(
    table: CorrelationTable,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    tracing::info!(interval_ms = interval.as_millis() as u64, "Exchange reaper starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reaped = table.reap_expired(Instant::now());
                if reaped > 0 {
                    tracing::info!(reaped, "Expired abandoned exchanges");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Exchange reaper received shutdown signal, exiting loop");
                break;
            }
        }
    }
}
