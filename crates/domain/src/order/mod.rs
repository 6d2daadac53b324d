//! Order entity and related types.

mod commands;
mod entity;
mod status;
mod value_objects;

pub use commands::CreateOrder;
pub use entity::Order;
pub use status::OrderStatus;
pub use value_objects::Money;

use common::OrderId;
use thiserror::Error;

/// Errors that can occur when building or changing an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// User ID is required.
    #[error("User ID is required")]
    UserIdRequired,

    /// Item ID is required.
    #[error("Item ID is required")]
    ItemIdRequired,

    /// Freeze reference is required.
    #[error("Freeze reference is required")]
    FreezeIdRequired,

    /// Invalid price.
    #[error("Invalid price: {price} (must not be negative)")]
    NegativePrice { price: i64 },

    /// The status change is not allowed by the state machine.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// A Paid transition must carry a payment timestamp.
    #[error("Payment timestamp is required when marking an order paid")]
    MissingPaymentTimestamp,

    /// Only a Paid transition may carry a payment timestamp.
    #[error("Payment timestamp is not allowed for status {status}")]
    UnexpectedPaymentTimestamp { status: OrderStatus },

    /// A stored order's status and payment timestamp disagree.
    #[error("Order status {status} does not match its payment timestamp")]
    PaymentTimestampMismatch { status: OrderStatus },

    /// The item/freeze binding is fixed at creation.
    #[error("Order {order_id} is bound to a different item or freeze")]
    FreezeBindingChanged { order_id: OrderId },

    /// A terminal order must never change.
    #[error("Order {order_id} is {status} and cannot be changed")]
    TerminalOrderChanged {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// The replacement state belongs to a different order.
    #[error("Order ID mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: OrderId, actual: OrderId },
}
