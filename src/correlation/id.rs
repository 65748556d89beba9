//! Correlation identifier generation.
//!
//! Identifiers only need to be unique among the entries alive at once, which
//! is a small set with a lifetime of seconds. The table regenerates on
//! collision, so generators are not required to be collision-free.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::IdStrategy;

/// Opaque token linking one data request to its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Source of fresh correlation identifiers.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn next_id(&self) -> RequestId;
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Short random base-36 tokens.
#[derive(Debug, Clone)]
pub struct RandomIdGenerator {
    len: usize,
}

impl RandomIdGenerator {
    pub fn new(len: usize) -> Self {
        Self { len: len.max(1) }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> RequestId {
        let id: String = (0..self.len)
            .map(|_| BASE36[fastrand::usize(..BASE36.len())] as char)
            .collect();
        RequestId(id)
    }
}

/// UUID v4 tokens.
#[derive(Debug, Clone, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> RequestId {
        RequestId(uuid::Uuid::new_v4().to_string())
    }
}

/// Monotonic `req-N` tokens.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> RequestId {
        // Relaxed is enough: only uniqueness matters.
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        RequestId(format!("req-{}", n))
    }
}

/// Build the generator selected in configuration.
pub fn generator_for(strategy: IdStrategy) -> Arc<dyn IdGenerator> {
    match strategy {
        IdStrategy::Random => Arc::new(RandomIdGenerator::default()),
        IdStrategy::Uuid => Arc::new(UuidIdGenerator),
        IdStrategy::Sequential => Arc::new(SequentialIdGenerator::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_ids_are_base36() {
        let generator = RandomIdGenerator::new(12);
        let id = generator.next_id();
        assert_eq!(id.as_str().len(), 12);
        assert!(id.as_str().bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_random_ids_rarely_repeat() {
        let generator = RandomIdGenerator::default();
        let ids: HashSet<_> = (0..1000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_sequential_ids() {
        let generator = SequentialIdGenerator::default();
        assert_eq!(generator.next_id().as_str(), "req-1");
        assert_eq!(generator.next_id().as_str(), "req-2");
    }

    #[test]
    fn test_uuid_ids_parse() {
        let id = UuidIdGenerator.next_id();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_request_id_serializes_as_string() {
        let id = RequestId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
