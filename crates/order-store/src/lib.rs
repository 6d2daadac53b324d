pub mod error;
pub mod memory;
pub mod store;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use store::{OrderStore, StatusUpdate};
