//! Domain layer for reservation-backed orders.
//!
//! This crate provides:
//! - The `Order` entity and its invariant checks
//! - The `OrderStatus` state enumeration
//! - The `CreateOrder` command and its validation
//!
//! All transitions are decided by the saga coordinator; the entity only
//! refuses changes that would break its invariants.

pub mod order;

pub use order::{CreateOrder, Money, Order, OrderError, OrderStatus};
