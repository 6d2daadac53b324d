//! Saga coordination for reservation-backed orders.
//!
//! An order is placed against a previously frozen inventory unit and then
//! finalized in one of two ways:
//! 1. Confirm: the freeze is committed, then the order becomes Paid
//! 2. Cancel: the freeze is released, then the order becomes Canceled
//!
//! Both the inventory calls and the coordinator operations are idempotent,
//! so any failure can be retried end-to-end.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod lock;
pub mod services;

pub use config::CoordinatorConfig;
pub use coordinator::{OrderCoordinator, TransitionOutcome};
pub use error::{CoordinatorError, InventoryError};
pub use lock::{InMemoryOrderLock, OrderLock};
pub use services::{FreezeState, InMemoryInventoryParticipant, InventoryParticipant};
