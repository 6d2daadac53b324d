//! Shared identifier types and identifier generation.

pub mod generator;
pub mod types;

pub use generator::{OrderIdGenerator, SequentialOrderIdGenerator, UuidOrderIdGenerator};
pub use types::{FreezeId, ItemId, OrderId, UserId};
