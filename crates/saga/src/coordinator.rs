//! Order coordinator driving the confirm/release saga.

use std::time::Instant;

use chrono::Utc;
use common::{OrderId, OrderIdGenerator, UuidOrderIdGenerator};
use domain::{CreateOrder, Order, OrderStatus};
use order_store::{OrderStore, StatusUpdate, StoreError};

use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, Result};
use crate::lock::{InMemoryOrderLock, OrderLock};
use crate::services::inventory::InventoryParticipant;

/// Result of a confirm or cancel request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// This call moved the order out of Pending.
    Applied(Order),

    /// The order was already finalized; nothing was done.
    Unchanged(OrderStatus),
}

impl TransitionOutcome {
    /// Returns true if this call performed the transition.
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }

    /// Returns the order status after the call.
    pub fn status(&self) -> OrderStatus {
        match self {
            TransitionOutcome::Applied(order) => order.status(),
            TransitionOutcome::Unchanged(status) => *status,
        }
    }
}

/// The two ways a Pending order can be finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finalize {
    Confirm,
    Cancel,
}

impl Finalize {
    fn as_str(&self) -> &'static str {
        match self {
            Finalize::Confirm => "confirm_pay",
            Finalize::Cancel => "cancel_order",
        }
    }

    fn target(&self) -> OrderStatus {
        match self {
            Finalize::Confirm => OrderStatus::Paid,
            Finalize::Cancel => OrderStatus::Canceled,
        }
    }

    /// Conditional update so only a still-Pending order is finalized.
    fn status_update(&self) -> StatusUpdate {
        let update = match self {
            Finalize::Confirm => StatusUpdate::paid(Utc::now()),
            Finalize::Cancel => StatusUpdate::canceled(),
        };
        update.expect(OrderStatus::Pending)
    }
}

/// Orchestrates order creation and the two terminal transitions.
///
/// Each transition runs load → decide → inventory call → persist while
/// holding the per-order lock, and persists through a compare-and-swap on
/// the Pending status. The coordinator keeps no order state of its own and
/// never retries internally: every failure leaves the order Pending and
/// the whole operation safe to repeat.
pub struct OrderCoordinator<S, I, L, G>
where
    S: OrderStore,
    I: InventoryParticipant,
    L: OrderLock,
    G: OrderIdGenerator,
{
    store: S,
    inventory: I,
    lock: L,
    ids: G,
    config: CoordinatorConfig,
}

impl<S, I> OrderCoordinator<S, I, InMemoryOrderLock, UuidOrderIdGenerator>
where
    S: OrderStore,
    I: InventoryParticipant,
{
    /// Creates a coordinator with a process-local lock and UUID order IDs.
    pub fn with_defaults(store: S, inventory: I) -> Self {
        Self::new(
            store,
            inventory,
            InMemoryOrderLock::new(),
            UuidOrderIdGenerator::new(),
        )
    }
}

impl<S, I, L, G> OrderCoordinator<S, I, L, G>
where
    S: OrderStore,
    I: InventoryParticipant,
    L: OrderLock,
    G: OrderIdGenerator,
{
    /// Creates a new order coordinator.
    pub fn new(store: S, inventory: I, lock: L, ids: G) -> Self {
        Self {
            store,
            inventory,
            lock,
            ids,
            config: CoordinatorConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Places a new Pending order against an existing freeze.
    ///
    /// After a persistence failure the order must be assumed not to exist.
    #[tracing::instrument(
        skip(self, cmd),
        fields(user_id = %cmd.user_id, item_id = %cmd.item_id, freeze_id = %cmd.freeze_id)
    )]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order> {
        let started = Instant::now();
        let order = Order::place(self.ids.next_id(), &cmd, Utc::now())?;

        if let Err(e) = self.store.save(&order).await {
            metrics::counter!("order_persistence_failures_total", "operation" => "create_order")
                .increment(1);
            tracing::warn!(order_id = %order.id(), error = %e, "failed to persist new order");
            return Err(CoordinatorError::PersistenceFailure(e));
        }

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_coordinator_duration_seconds", "operation" => "create_order")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id(), price = %order.price(), "order created");

        Ok(order)
    }

    /// Confirms the freeze behind a Pending order and marks it Paid.
    ///
    /// A no-op for orders that are already Paid, Canceled or Failed.
    #[tracing::instrument(skip(self, order_id), fields(order_id = %order_id))]
    pub async fn confirm_pay(&self, order_id: &OrderId) -> Result<TransitionOutcome> {
        self.finalize(order_id, Finalize::Confirm).await
    }

    /// Releases the freeze behind a Pending order and marks it Canceled.
    ///
    /// A no-op for orders that are already Paid, Canceled or Failed.
    #[tracing::instrument(skip(self, order_id), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<TransitionOutcome> {
        self.finalize(order_id, Finalize::Cancel).await
    }

    /// Loads the current state of an order from the store.
    pub async fn get_order(&self, order_id: &OrderId) -> Result<Order> {
        Ok(self.store.find_by_id(order_id).await?)
    }

    async fn finalize(&self, order_id: &OrderId, step: Finalize) -> Result<TransitionOutcome> {
        let started = Instant::now();

        let _guard = tokio::time::timeout(self.config.lock_timeout, self.lock.acquire(order_id))
            .await
            .map_err(|_| CoordinatorError::LockTimeout {
                order_id: order_id.clone(),
            })?;

        let order = self.store.find_by_id(order_id).await?;

        if !order.is_pending() {
            metrics::counter!("order_transition_noops_total", "transition" => step.as_str())
                .increment(1);
            tracing::debug!(status = %order.status(), "order already finalized, nothing to do");
            metrics::histogram!("order_coordinator_duration_seconds", "operation" => step.as_str())
                .record(started.elapsed().as_secs_f64());
            return Ok(TransitionOutcome::Unchanged(order.status()));
        }

        let call = match step {
            Finalize::Confirm => {
                self.inventory
                    .confirm(order.item_id(), order.freeze_id())
                    .await
            }
            Finalize::Cancel => {
                self.inventory
                    .release(order.item_id(), order.freeze_id())
                    .await
            }
        };

        if let Err(e) = call {
            metrics::counter!("order_dependency_failures_total", "operation" => step.as_str())
                .increment(1);
            tracing::warn!(
                item_id = %order.item_id(),
                freeze_id = %order.freeze_id(),
                error = %e,
                "inventory call failed, order left pending"
            );
            return Err(e.into());
        }

        let outcome = match self.store.update_status(order_id, step.status_update()).await {
            Ok(updated) => {
                metrics::counter!("order_transitions_total", "transition" => step.as_str())
                    .increment(1);
                tracing::info!(status = %updated.status(), "order finalized");
                TransitionOutcome::Applied(updated)
            }
            Err(StoreError::StatusConflict { actual, .. }) => {
                metrics::counter!("order_transition_noops_total", "transition" => step.as_str())
                    .increment(1);
                if actual == step.target() {
                    tracing::debug!(status = %actual, "order finalized concurrently");
                } else {
                    tracing::warn!(
                        status = %actual,
                        attempted = %step.target(),
                        "inventory call succeeded but order was finalized differently"
                    );
                }
                TransitionOutcome::Unchanged(actual)
            }
            Err(e) => {
                metrics::counter!("order_persistence_failures_total", "operation" => step.as_str())
                    .increment(1);
                tracing::warn!(
                    error = %e,
                    "inventory call succeeded but order status was not persisted; retry is safe"
                );
                return Err(e.into());
            }
        };

        metrics::histogram!("order_coordinator_duration_seconds", "operation" => step.as_str())
            .record(started.elapsed().as_secs_f64());

        Ok(outcome)
    }
}
