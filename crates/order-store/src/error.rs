use common::OrderId;
use domain::{OrderError, OrderStatus};
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No order with the given identifier exists.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A conditional status update found a different current status.
    #[error("Status conflict for order {order_id}: expected {expected}, found {actual}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The write would break an order invariant.
    #[error("Invalid order write: {0}")]
    InvalidOrder(#[from] OrderError),

    /// The storage layer failed.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
