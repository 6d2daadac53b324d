use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Order, OrderStatus};

use crate::{OrderId, Result};

/// A status-only transition to apply to a stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Status to move the order to.
    pub new_status: OrderStatus,

    /// Payment timestamp; must be set exactly for `Paid`.
    pub paid_at: Option<DateTime<Utc>>,

    /// Status the order must currently have for the update to apply.
    /// If None, no status check is performed beyond the entity rules.
    pub expected_status: Option<OrderStatus>,
}

impl StatusUpdate {
    /// Creates an unconditional update to `status`.
    pub fn new(status: OrderStatus) -> Self {
        Self {
            new_status: status,
            paid_at: None,
            expected_status: None,
        }
    }

    /// Creates an update marking the order paid at `at`.
    pub fn paid(at: DateTime<Utc>) -> Self {
        Self {
            new_status: OrderStatus::Paid,
            paid_at: Some(at),
            expected_status: None,
        }
    }

    /// Creates an update marking the order canceled.
    pub fn canceled() -> Self {
        Self::new(OrderStatus::Canceled)
    }

    /// Creates an update marking the order failed.
    pub fn failed() -> Self {
        Self::new(OrderStatus::Failed)
    }

    /// Makes the update conditional on the order currently being in `status`.
    pub fn expect(mut self, status: OrderStatus) -> Self {
        self.expected_status = Some(status);
        self
    }
}

/// Persistence port for orders.
///
/// The store is the single source of truth for order state. It must not
/// change fields on its own; it only applies what callers hand it.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists the full state of an order, creating or overwriting it.
    ///
    /// The write is atomic for the order: readers see either the old or
    /// the new state, never a mix.
    async fn save(&self, order: &Order) -> Result<()>;

    /// Loads an order by ID.
    ///
    /// Fails with `NotFound` if no such order exists.
    async fn find_by_id(&self, id: &OrderId) -> Result<Order>;

    /// Atomically applies a status transition and returns the updated order.
    ///
    /// If `update.expected_status` is set, the operation fails with
    /// `StatusConflict` and changes nothing when the current status differs.
    async fn update_status(&self, id: &OrderId, update: StatusUpdate) -> Result<Order>;
}
