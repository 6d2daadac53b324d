//! Saga error types.

use common::{FreezeId, ItemId, OrderId};
use domain::{OrderError, OrderStatus};
use order_store::StoreError;
use thiserror::Error;

/// Errors reported by an inventory participant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// No freeze exists for the item/freeze pair.
    #[error("Unknown freeze {freeze_id} for item {item_id}")]
    UnknownFreeze { item_id: ItemId, freeze_id: FreezeId },

    /// The freeze expired before it was confirmed or released.
    #[error("Freeze {freeze_id} for item {item_id} has expired")]
    FreezeExpired { item_id: ItemId, freeze_id: FreezeId },

    /// The freeze was already released and cannot be confirmed.
    #[error("Freeze {freeze_id} for item {item_id} was already released")]
    FreezeReleased { item_id: ItemId, freeze_id: FreezeId },

    /// The inventory service could not be reached or failed internally.
    #[error("Inventory service unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during order coordination.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The order does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The order was not in the status a transition required.
    #[error("Status conflict for order {order_id}: expected {expected}, found {actual}")]
    ConflictStatus {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The inventory participant call failed.
    #[error("Inventory dependency failed: {0}")]
    DependencyFailure(#[source] InventoryError),

    /// The order store call failed.
    #[error("Order persistence failed: {0}")]
    PersistenceFailure(#[source] StoreError),

    /// The order request violates the construction requirements.
    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] OrderError),

    /// The per-order lock could not be acquired in time.
    #[error("Timed out waiting for lock on order {order_id}")]
    LockTimeout { order_id: OrderId },
}

impl CoordinatorError {
    /// Returns true if retrying the same operation may succeed.
    ///
    /// State may or may not have progressed after a retryable failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            CoordinatorError::NotFound(_) | CoordinatorError::InvalidOrder(_)
        )
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CoordinatorError::NotFound(id),
            StoreError::StatusConflict {
                order_id,
                expected,
                actual,
            } => CoordinatorError::ConflictStatus {
                order_id,
                expected,
                actual,
            },
            other => CoordinatorError::PersistenceFailure(other),
        }
    }
}

impl From<InventoryError> for CoordinatorError {
    fn from(err: InventoryError) -> Self {
        CoordinatorError::DependencyFailure(err)
    }
}

/// Convenience type alias for coordinator results.
pub type Result<T> = std::result::Result<T, CoordinatorError>;
