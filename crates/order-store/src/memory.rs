use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use domain::Order;
use tokio::sync::RwLock;

use crate::{
    OrderId, Result, StoreError,
    store::{OrderStore, StatusUpdate},
};

#[derive(Debug, Default)]
struct FaultSwitches {
    fail_on_save: AtomicBool,
    fail_on_update: AtomicBool,
    fail_on_find: AtomicBool,
}

/// In-memory order store implementation for testing.
///
/// Every operation runs under a single lock acquisition, so each one is
/// atomic with respect to the order it touches. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    faults: Arc<FaultSwitches>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail `save` calls with `Unavailable`.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.faults.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Configures the store to fail `update_status` calls with `Unavailable`.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.faults.fail_on_update.store(fail, Ordering::SeqCst);
    }

    /// Configures the store to fail `find_by_id` calls with `Unavailable`.
    pub fn set_fail_on_find(&self, fail: bool) {
        self.faults.fail_on_find.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns the number of successful writes (saves and status updates).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }

    fn check_fault(&self, switch: &AtomicBool, operation: &str) -> Result<()> {
        if switch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on {operation}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn save(&self, order: &Order) -> Result<()> {
        self.check_fault(&self.faults.fail_on_save, "save")?;

        let mut orders = self.orders.write().await;
        match orders.get(order.id()) {
            Some(existing) => existing.check_replacement(order)?,
            None => order.validate()?,
        }
        orders.insert(order.id().clone(), order.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Order> {
        self.check_fault(&self.faults.fail_on_find, "find_by_id")?;

        let orders = self.orders.read().await;
        orders
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    #[tracing::instrument(skip(self, id), fields(order_id = %id))]
    async fn update_status(&self, id: &OrderId, update: StatusUpdate) -> Result<Order> {
        self.check_fault(&self.faults.fail_on_update, "update_status")?;

        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        // Check expected status if specified
        if let Some(expected) = update.expected_status
            && order.status() != expected
        {
            return Err(StoreError::StatusConflict {
                order_id: id.clone(),
                expected,
                actual: order.status(),
            });
        }

        // Apply on a copy so a rejected transition leaves the stored order untouched
        let mut next = order.clone();
        next.record_status(update.new_status, update.paid_at)?;
        *order = next.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(next)
    }
}
