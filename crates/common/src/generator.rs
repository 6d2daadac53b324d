//! Order identifier generation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::OrderId;

/// Produces fresh, globally unique order identifiers.
pub trait OrderIdGenerator: Send + Sync {
    fn next_id(&self) -> OrderId;
}

/// Generates random UUID v4 order IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidOrderIdGenerator;

impl UuidOrderIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl OrderIdGenerator for UuidOrderIdGenerator {
    fn next_id(&self) -> OrderId {
        OrderId::new(Uuid::new_v4().to_string())
    }
}

/// Deterministic generator yielding `PREFIX-0001`, `PREFIX-0002`, ...
///
/// Clones share the same counter.
#[derive(Debug, Clone)]
pub struct SequentialOrderIdGenerator {
    prefix: String,
    next: Arc<AtomicU64>,
}

impl SequentialOrderIdGenerator {
    /// Creates a generator with the default `ORD` prefix.
    pub fn new() -> Self {
        Self::with_prefix("ORD")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Returns how many IDs have been handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst) - 1
    }
}

impl Default for SequentialOrderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderIdGenerator for SequentialOrderIdGenerator {
    fn next_id(&self) -> OrderId {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        OrderId::new(format!("{}-{:04}", self.prefix, n))
    }
}
