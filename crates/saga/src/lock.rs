//! Per-order advisory locking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Advisory lock keyed by order ID.
///
/// The coordinator holds the guard for the whole
/// load → decide → dependency call → persist sequence of one order.
/// Dropping the guard releases the lock.
#[async_trait]
pub trait OrderLock: Send + Sync {
    type Guard: Send;

    /// Waits until the lock for `order_id` is free and takes it.
    async fn acquire(&self, order_id: &OrderId) -> Self::Guard;
}

/// Process-local lock table.
///
/// Serializes callers inside one process only; deployments with several
/// coordinator processes need a shared lock implementation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderLock {
    slots: Arc<Mutex<HashMap<OrderId, Arc<AsyncMutex<()>>>>>,
}

impl InMemoryOrderLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders with a live lock slot.
    pub fn slot_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot(&self, order_id: &OrderId) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Drop slots nobody holds or waits on
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        slots
            .entry(order_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[async_trait]
impl OrderLock for InMemoryOrderLock {
    type Guard = OwnedMutexGuard<()>;

    async fn acquire(&self, order_id: &OrderId) -> Self::Guard {
        self.slot(order_id).lock_owned().await
    }
}
