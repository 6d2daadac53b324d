//! Integration tests for the order confirm/cancel saga.

use std::sync::{Arc, Once};

use async_trait::async_trait;
use common::{FreezeId, ItemId, OrderId, SequentialOrderIdGenerator};
use domain::{CreateOrder, Order, OrderStatus};
use order_store::{InMemoryOrderStore, OrderStore};
use saga::{
    CoordinatorError, FreezeState, InMemoryInventoryParticipant, InMemoryOrderLock,
    InventoryError, InventoryParticipant, OrderCoordinator, OrderLock, TransitionOutcome,
};
use tokio::sync::Barrier;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

type TestCoordinator = OrderCoordinator<
    InMemoryOrderStore,
    InMemoryInventoryParticipant,
    InMemoryOrderLock,
    SequentialOrderIdGenerator,
>;

struct TestHarness {
    coordinator: Arc<TestCoordinator>,
    store: InMemoryOrderStore,
    inventory: InMemoryInventoryParticipant,
}

impl TestHarness {
    fn new() -> Self {
        init_tracing();
        let store = InMemoryOrderStore::new();
        let inventory = InMemoryInventoryParticipant::new();

        let coordinator = OrderCoordinator::new(
            store.clone(),
            inventory.clone(),
            InMemoryOrderLock::new(),
            SequentialOrderIdGenerator::new(),
        );

        Self {
            coordinator: Arc::new(coordinator),
            store,
            inventory,
        }
    }

    /// Freezes a unit of item 42 and places an order against it.
    async fn create_order(&self, freeze: &str) -> Order {
        self.inventory.freeze(42, freeze);
        self.coordinator
            .create_order(CreateOrder::new(1, 42, freeze, 500))
            .await
            .unwrap()
    }

    async fn stored(&self, id: &OrderId) -> Order {
        self.store.find_by_id(id).await.unwrap()
    }
}

#[tokio::test]
async fn test_create_order_is_pending_without_payment_time() {
    let h = TestHarness::new();

    let order = h.create_order("f-1").await;

    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.price().minor_units(), 500);
    assert_eq!(order.user_id().as_i64(), 1);
    assert_eq!(order.item_id().as_i64(), 42);
    assert_eq!(order.freeze_id().as_str(), "f-1");
    assert!(order.paid_at().is_none());
    assert_eq!(h.stored(order.id()).await, order);
}

#[tokio::test]
async fn test_confirm_pay_then_repeat_is_noop() {
    let h = TestHarness::new();
    let order = h.create_order("f-1").await;

    let first = h.coordinator.confirm_pay(order.id()).await.unwrap();
    assert!(first.is_applied());
    let paid = h.stored(order.id()).await;
    assert_eq!(paid.status(), OrderStatus::Paid);
    assert!(paid.paid_at().is_some());

    let writes = h.store.write_count();
    let second = h.coordinator.confirm_pay(order.id()).await.unwrap();

    assert_eq!(second, TransitionOutcome::Unchanged(OrderStatus::Paid));
    assert_eq!(h.inventory.confirm_calls(), 1);
    assert_eq!(h.store.write_count(), writes);
    assert_eq!(h.stored(order.id()).await, paid);
}

#[tokio::test]
async fn test_cancel_order_then_repeat_is_noop() {
    let h = TestHarness::new();
    let order = h.create_order("f-1").await;

    let first = h.coordinator.cancel_order(order.id()).await.unwrap();
    assert_eq!(first.status(), OrderStatus::Canceled);

    let writes = h.store.write_count();
    let second = h.coordinator.cancel_order(order.id()).await.unwrap();

    assert_eq!(second, TransitionOutcome::Unchanged(OrderStatus::Canceled));
    assert_eq!(h.inventory.release_calls(), 1);
    assert_eq!(h.store.write_count(), writes);
}

#[tokio::test]
async fn test_canceled_order_never_becomes_paid() {
    let h = TestHarness::new();
    let order = h.create_order("f-1").await;

    h.coordinator.cancel_order(order.id()).await.unwrap();
    let outcome = h.coordinator.confirm_pay(order.id()).await.unwrap();

    assert_eq!(outcome, TransitionOutcome::Unchanged(OrderStatus::Canceled));
    let stored = h.stored(order.id()).await;
    assert_eq!(stored.status(), OrderStatus::Canceled);
    assert!(stored.paid_at().is_none());
    assert_eq!(h.inventory.confirm_calls(), 0);
    assert_eq!(
        h.inventory.freeze_state(42, "f-1"),
        Some(FreezeState::Released)
    );
}

#[tokio::test]
async fn test_paid_order_never_becomes_canceled() {
    let h = TestHarness::new();
    let order = h.create_order("f-1").await;

    h.coordinator.confirm_pay(order.id()).await.unwrap();
    let outcome = h.coordinator.cancel_order(order.id()).await.unwrap();

    assert_eq!(outcome, TransitionOutcome::Unchanged(OrderStatus::Paid));
    assert_eq!(h.stored(order.id()).await.status(), OrderStatus::Paid);
    assert_eq!(h.inventory.release_calls(), 0);
    assert_eq!(
        h.inventory.freeze_state(42, "f-1"),
        Some(FreezeState::Confirmed)
    );
}

#[tokio::test]
async fn test_confirm_failure_leaves_order_pending() {
    let h = TestHarness::new();
    let order = h.create_order("f-1").await;
    h.inventory.set_fail_on_confirm(true);

    let err = h.coordinator.confirm_pay(order.id()).await.unwrap_err();

    assert!(matches!(err, CoordinatorError::DependencyFailure(_)));
    assert!(err.is_retryable());
    let stored = h.stored(order.id()).await;
    assert_eq!(stored.status(), OrderStatus::Pending);
    assert!(stored.paid_at().is_none());

    // Retry once the dependency recovers
    h.inventory.set_fail_on_confirm(false);
    let outcome = h.coordinator.confirm_pay(order.id()).await.unwrap();
    assert_eq!(outcome.status(), OrderStatus::Paid);
}

#[tokio::test]
async fn test_expired_freeze_is_dependency_failure() {
    let h = TestHarness::new();
    let order = h.create_order("f-1").await;
    h.inventory.expire(42, "f-1");

    let err = h.coordinator.confirm_pay(order.id()).await.unwrap_err();

    assert!(matches!(
        err,
        CoordinatorError::DependencyFailure(InventoryError::FreezeExpired { .. })
    ));
    assert_eq!(h.stored(order.id()).await.status(), OrderStatus::Pending);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let h = TestHarness::new();
    let missing = OrderId::new("ORD-9999");

    let confirm = h.coordinator.confirm_pay(&missing).await.unwrap_err();
    let cancel = h.coordinator.cancel_order(&missing).await.unwrap_err();

    assert!(matches!(confirm, CoordinatorError::NotFound(ref id) if id == &missing));
    assert!(matches!(cancel, CoordinatorError::NotFound(_)));
    assert!(!confirm.is_retryable());
    assert_eq!(h.inventory.confirm_calls(), 0);
    assert_eq!(h.inventory.release_calls(), 0);
}

#[tokio::test]
async fn test_failed_order_is_terminal_for_both_operations() {
    let h = TestHarness::new();
    let order = h.create_order("f-1").await;
    h.store
        .update_status(order.id(), order_store::StatusUpdate::failed())
        .await
        .unwrap();

    let confirm = h.coordinator.confirm_pay(order.id()).await.unwrap();
    let cancel = h.coordinator.cancel_order(order.id()).await.unwrap();

    assert_eq!(confirm, TransitionOutcome::Unchanged(OrderStatus::Failed));
    assert_eq!(cancel, TransitionOutcome::Unchanged(OrderStatus::Failed));
    assert_eq!(h.inventory.confirm_calls(), 0);
    assert_eq!(h.inventory.release_calls(), 0);
}

#[tokio::test]
async fn test_orders_are_independent() {
    let h = TestHarness::new();
    let a = h.create_order("f-a").await;
    let b = h.create_order("f-b").await;

    h.coordinator.confirm_pay(a.id()).await.unwrap();
    h.coordinator.cancel_order(b.id()).await.unwrap();

    assert_eq!(a.id(), &OrderId::new("ORD-0001"));
    assert_eq!(b.id(), &OrderId::new("ORD-0002"));
    assert_eq!(h.stored(a.id()).await.status(), OrderStatus::Paid);
    assert_eq!(h.stored(b.id()).await.status(), OrderStatus::Canceled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_confirms_call_inventory_once() {
    let h = TestHarness::new();
    let order = h.create_order("f-1").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = h.coordinator.clone();
        let id = order.id().clone();
        handles.push(tokio::spawn(
            async move { coordinator.confirm_pay(&id).await },
        ));
    }

    let mut applied = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.status(), OrderStatus::Paid);
        if outcome.is_applied() {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    assert_eq!(h.inventory.confirm_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_confirm_and_cancel_race_has_single_consistent_winner() {
    let h = TestHarness::new();
    let order = h.create_order("f-1").await;

    let confirm = {
        let coordinator = h.coordinator.clone();
        let id = order.id().clone();
        tokio::spawn(async move { coordinator.confirm_pay(&id).await })
    };
    let cancel = {
        let coordinator = h.coordinator.clone();
        let id = order.id().clone();
        tokio::spawn(async move { coordinator.cancel_order(&id).await })
    };

    let confirm = confirm.await.unwrap().unwrap();
    let cancel = cancel.await.unwrap().unwrap();

    assert!(confirm.is_applied() ^ cancel.is_applied());
    let stored = h.stored(order.id()).await;
    let freeze = h.inventory.freeze_state(42, "f-1");
    match stored.status() {
        OrderStatus::Paid => assert_eq!(freeze, Some(FreezeState::Confirmed)),
        OrderStatus::Canceled => assert_eq!(freeze, Some(FreezeState::Released)),
        other => panic!("unexpected status {other}"),
    }
}

/// Lock that never blocks, so only the store's conditional update guards the race.
struct NoLock;

#[async_trait]
impl OrderLock for NoLock {
    type Guard = ();

    async fn acquire(&self, _order_id: &OrderId) -> Self::Guard {}
}

/// Inventory that holds every confirm until two callers have arrived.
#[derive(Clone)]
struct RendezvousInventory {
    inner: InMemoryInventoryParticipant,
    barrier: Arc<Barrier>,
}

#[async_trait]
impl InventoryParticipant for RendezvousInventory {
    async fn confirm(&self, item_id: ItemId, freeze_id: &FreezeId) -> Result<(), InventoryError> {
        self.barrier.wait().await;
        self.inner.confirm(item_id, freeze_id).await
    }

    async fn release(&self, item_id: ItemId, freeze_id: &FreezeId) -> Result<(), InventoryError> {
        self.inner.release(item_id, freeze_id).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_conditional_update_absorbs_duplicate_confirm_without_lock() {
    init_tracing();
    let store = InMemoryOrderStore::new();
    let inner = InMemoryInventoryParticipant::new();
    inner.freeze(42, "f-1");
    let inventory = RendezvousInventory {
        inner: inner.clone(),
        barrier: Arc::new(Barrier::new(2)),
    };
    let coordinator = Arc::new(OrderCoordinator::new(
        store.clone(),
        inventory,
        NoLock,
        SequentialOrderIdGenerator::new(),
    ));
    let order = coordinator
        .create_order(CreateOrder::new(1, 42, "f-1", 500))
        .await
        .unwrap();

    let first = {
        let coordinator = coordinator.clone();
        let id = order.id().clone();
        tokio::spawn(async move { coordinator.confirm_pay(&id).await })
    };
    let second = {
        let coordinator = coordinator.clone();
        let id = order.id().clone();
        tokio::spawn(async move { coordinator.confirm_pay(&id).await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    // Both reached the dependency; exactly one persisted the transition
    assert_eq!(inner.confirm_calls(), 2);
    assert!(first.is_applied() ^ second.is_applied());
    assert_eq!(first.status(), OrderStatus::Paid);
    assert_eq!(second.status(), OrderStatus::Paid);
    assert_eq!(
        store.find_by_id(order.id()).await.unwrap().status(),
        OrderStatus::Paid
    );
}
