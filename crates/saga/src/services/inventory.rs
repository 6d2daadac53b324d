//! Inventory participant trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use common::{FreezeId, ItemId};

use crate::error::InventoryError;

/// Saga counterpart holding the frozen inventory unit behind an order.
///
/// Both operations must be idempotent: the coordinator may repeat a call
/// after a crash between the call and persisting the order's new status.
#[async_trait]
pub trait InventoryParticipant: Send + Sync {
    /// Commits the frozen unit to the order.
    ///
    /// Confirming an already-confirmed freeze succeeds without side effect.
    async fn confirm(&self, item_id: ItemId, freeze_id: &FreezeId) -> Result<(), InventoryError>;

    /// Returns the frozen unit to available inventory (compensating action).
    ///
    /// Releasing an already-released freeze succeeds without side effect.
    async fn release(&self, item_id: ItemId, freeze_id: &FreezeId) -> Result<(), InventoryError>;
}

/// Lifecycle of a freeze inside [`InMemoryInventoryParticipant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeState {
    Frozen,
    Confirmed,
    Released,
    Expired,
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    freezes: HashMap<(ItemId, FreezeId), FreezeState>,
    fail_on_confirm: bool,
    fail_on_release: bool,
}

/// In-memory inventory participant for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryParticipant {
    state: Arc<RwLock<InMemoryInventoryState>>,
    confirm_calls: Arc<AtomicUsize>,
    release_calls: Arc<AtomicUsize>,
}

impl InMemoryInventoryParticipant {
    /// Creates a new in-memory inventory participant with no freezes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freeze, as the out-of-scope reservation step would.
    pub fn freeze(&self, item_id: impl Into<ItemId>, freeze_id: impl Into<FreezeId>) {
        self.write()
            .freezes
            .insert((item_id.into(), freeze_id.into()), FreezeState::Frozen);
    }

    /// Marks a freeze as expired.
    pub fn expire(&self, item_id: impl Into<ItemId>, freeze_id: impl Into<FreezeId>) {
        self.write()
            .freezes
            .insert((item_id.into(), freeze_id.into()), FreezeState::Expired);
    }

    /// Returns the state of a freeze, if it is known.
    pub fn freeze_state(
        &self,
        item_id: impl Into<ItemId>,
        freeze_id: impl Into<FreezeId>,
    ) -> Option<FreezeState> {
        self.read()
            .freezes
            .get(&(item_id.into(), freeze_id.into()))
            .copied()
    }

    /// Configures the participant to fail confirm calls.
    pub fn set_fail_on_confirm(&self, fail: bool) {
        self.write().fail_on_confirm = fail;
    }

    /// Configures the participant to fail release calls.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.write().fail_on_release = fail;
    }

    /// Returns how many times `confirm` has been called.
    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    /// Returns how many times `release` has been called.
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryInventoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryInventoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl InventoryParticipant for InMemoryInventoryParticipant {
    async fn confirm(&self, item_id: ItemId, freeze_id: &FreezeId) -> Result<(), InventoryError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.write();

        if state.fail_on_confirm {
            return Err(InventoryError::Unavailable(
                "inventory confirm rejected".to_string(),
            ));
        }

        let key = (item_id, freeze_id.clone());
        match state.freezes.get(&key).copied() {
            None => Err(InventoryError::UnknownFreeze {
                item_id,
                freeze_id: freeze_id.clone(),
            }),
            Some(FreezeState::Expired) => Err(InventoryError::FreezeExpired {
                item_id,
                freeze_id: freeze_id.clone(),
            }),
            Some(FreezeState::Released) => Err(InventoryError::FreezeReleased {
                item_id,
                freeze_id: freeze_id.clone(),
            }),
            Some(FreezeState::Confirmed) => Ok(()),
            Some(FreezeState::Frozen) => {
                state.freezes.insert(key, FreezeState::Confirmed);
                Ok(())
            }
        }
    }

    async fn release(&self, item_id: ItemId, freeze_id: &FreezeId) -> Result<(), InventoryError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.write();

        if state.fail_on_release {
            return Err(InventoryError::Unavailable(
                "inventory release rejected".to_string(),
            ));
        }

        let key = (item_id, freeze_id.clone());
        match state.freezes.get(&key).copied() {
            None => Err(InventoryError::UnknownFreeze {
                item_id,
                freeze_id: freeze_id.clone(),
            }),
            Some(FreezeState::Expired) => Err(InventoryError::FreezeExpired {
                item_id,
                freeze_id: freeze_id.clone(),
            }),
            Some(FreezeState::Released) => Ok(()),
            Some(FreezeState::Frozen | FreezeState::Confirmed) => {
                state.freezes.insert(key, FreezeState::Released);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_is_idempotent() {
        let inventory = InMemoryInventoryParticipant::new();
        inventory.freeze(42, "f-1");
        let freeze = FreezeId::new("f-1");

        inventory.confirm(ItemId::new(42), &freeze).await.unwrap();
        inventory.confirm(ItemId::new(42), &freeze).await.unwrap();

        assert_eq!(
            inventory.freeze_state(42, "f-1"),
            Some(FreezeState::Confirmed)
        );
        assert_eq!(inventory.confirm_calls(), 2);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let inventory = InMemoryInventoryParticipant::new();
        inventory.freeze(42, "f-1");
        let freeze = FreezeId::new("f-1");

        inventory.release(ItemId::new(42), &freeze).await.unwrap();
        inventory.release(ItemId::new(42), &freeze).await.unwrap();

        assert_eq!(
            inventory.freeze_state(42, "f-1"),
            Some(FreezeState::Released)
        );
        assert_eq!(inventory.release_calls(), 2);
    }

    #[tokio::test]
    async fn test_release_compensates_confirmed_freeze() {
        let inventory = InMemoryInventoryParticipant::new();
        inventory.freeze(42, "f-1");
        let freeze = FreezeId::new("f-1");

        inventory.confirm(ItemId::new(42), &freeze).await.unwrap();
        inventory.release(ItemId::new(42), &freeze).await.unwrap();

        assert_eq!(
            inventory.freeze_state(42, "f-1"),
            Some(FreezeState::Released)
        );
    }

    #[tokio::test]
    async fn test_confirm_after_release_fails() {
        let inventory = InMemoryInventoryParticipant::new();
        inventory.freeze(42, "f-1");
        let freeze = FreezeId::new("f-1");

        inventory.release(ItemId::new(42), &freeze).await.unwrap();
        let result = inventory.confirm(ItemId::new(42), &freeze).await;

        assert!(matches!(result, Err(InventoryError::FreezeReleased { .. })));
    }

    #[tokio::test]
    async fn test_unknown_and_expired_freezes_fail() {
        let inventory = InMemoryInventoryParticipant::new();
        inventory.expire(42, "f-old");

        let unknown = inventory.confirm(ItemId::new(42), &FreezeId::new("nope")).await;
        assert!(matches!(unknown, Err(InventoryError::UnknownFreeze { .. })));

        let expired = inventory
            .release(ItemId::new(42), &FreezeId::new("f-old"))
            .await;
        assert!(matches!(expired, Err(InventoryError::FreezeExpired { .. })));
    }

    #[tokio::test]
    async fn test_freeze_is_keyed_by_item() {
        let inventory = InMemoryInventoryParticipant::new();
        inventory.freeze(42, "f-1");

        let result = inventory.confirm(ItemId::new(7), &FreezeId::new("f-1")).await;
        assert!(matches!(result, Err(InventoryError::UnknownFreeze { .. })));
        assert_eq!(inventory.freeze_state(42, "f-1"), Some(FreezeState::Frozen));
    }

    #[tokio::test]
    async fn test_injected_failures_leave_freeze_untouched() {
        let inventory = InMemoryInventoryParticipant::new();
        inventory.freeze(42, "f-1");
        inventory.set_fail_on_confirm(true);
        inventory.set_fail_on_release(true);
        let freeze = FreezeId::new("f-1");

        assert!(inventory.confirm(ItemId::new(42), &freeze).await.is_err());
        assert!(inventory.release(ItemId::new(42), &freeze).await.is_err());
        assert_eq!(inventory.freeze_state(42, "f-1"), Some(FreezeState::Frozen));
    }
}
