//! Connected controlling clients.
//!
//! # Responsibilities
//! - Track peers in connection order
//! - Hand out a sender for the peer a request should go to
//!
//! The first connected `window` client is the addressable peer. When several
//! are connected the others are never asked; which one originated a stream is
//! not known to the server.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::correlation::ExchangeError;
use crate::peer::message::DataMessage;

/// Global atomic counter for peer IDs.
static PEER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connected peer. Ordered by connection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PeerId(u64);

impl PeerId {
    fn next() -> Self {
        Self(PEER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Kind of client a peer announced itself as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    #[default]
    Window,
    Worker,
    SharedWorker,
}

/// Sending side of a connected peer.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    id: PeerId,
    client_type: ClientType,
    tx: mpsc::Sender<DataMessage>,
}

impl PeerHandle {
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Queue a message for the peer's socket writer.
    pub async fn send(&self, message: DataMessage) -> Result<(), ExchangeError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| ExchangeError::PeerUnreachable)
    }
}

/// Snapshot of a connected peer for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct PeerInfo {
    pub id: PeerId,
    pub client_type: ClientType,
}

/// Set of connected peers.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<RwLock<BTreeMap<PeerId, PeerHandle>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. Returns its handle and the queue its writer drains.
    pub fn register(
        &self,
        client_type: ClientType,
        buffer: usize,
    ) -> (PeerHandle, mpsc::Receiver<DataMessage>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let handle = PeerHandle {
            id: PeerId::next(),
            client_type,
            tx,
        };
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.id, handle.clone());
        (handle, rx)
    }

    pub fn unregister(&self, id: PeerId) -> bool {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Earliest connected peer of the given type.
    pub fn first_of(&self, client_type: ClientType) -> Option<PeerHandle> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|p| p.client_type == client_type)
            .cloned()
    }

    /// The peer data requests are sent to.
    pub fn controlling_peer(&self) -> Option<PeerHandle> {
        self.first_of(ClientType::Window)
    }

    pub fn snapshot(&self) -> Vec<PeerInfo> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|p| PeerInfo {
                id: p.id,
                client_type: p.client_type,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::RequestId;

    #[test]
    fn test_selects_first_window_client() {
        let registry = PeerRegistry::new();
        let (_worker, _wrx) = registry.register(ClientType::Worker, 4);
        let (first, _rx1) = registry.register(ClientType::Window, 4);
        let (_second, _rx2) = registry.register(ClientType::Window, 4);

        let selected = registry.controlling_peer().unwrap();
        assert_eq!(selected.id(), first.id());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_no_window_client() {
        let registry = PeerRegistry::new();
        assert!(registry.controlling_peer().is_none());

        let (_worker, _rx) = registry.register(ClientType::Worker, 4);
        assert!(registry.controlling_peer().is_none());
    }

    #[test]
    fn test_unregister_promotes_next_peer() {
        let registry = PeerRegistry::new();
        let (first, _rx1) = registry.register(ClientType::Window, 4);
        let (second, _rx2) = registry.register(ClientType::Window, 4);

        assert!(registry.unregister(first.id()));
        assert!(!registry.unregister(first.id()));
        assert_eq!(registry.controlling_peer().unwrap().id(), second.id());
    }

    #[tokio::test]
    async fn test_send_to_closed_peer_fails() {
        let registry = PeerRegistry::new();
        let (peer, rx) = registry.register(ClientType::Window, 4);
        drop(rx);

        let result = peer
            .send(DataMessage::DataError {
                request_id: RequestId::from("x"),
            })
            .await;
        assert_eq!(result, Err(ExchangeError::PeerUnreachable));
    }

    #[test]
    fn test_client_type_names() {
        let parsed: ClientType = serde_json::from_str("\"sharedworker\"").unwrap();
        assert_eq!(parsed, ClientType::SharedWorker);
        assert_eq!(serde_json::to_string(&ClientType::Window).unwrap(), "\"window\"");
    }
}
