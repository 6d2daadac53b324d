//! External saga participants and in-memory implementations.

pub mod inventory;

pub use inventory::{FreezeState, InMemoryInventoryParticipant, InventoryParticipant};
