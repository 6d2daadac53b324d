//! Order entity.

use chrono::{DateTime, Utc};
use common::{FreezeId, ItemId, OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{CreateOrder, Money, OrderError, OrderStatus};

/// One reservation-to-purchase attempt.
///
/// The entity holds data and guards its invariants; it never decides a
/// transition on its own. Deserialized orders go through [`Order::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderRecord")]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// User who placed the order.
    user_id: UserId,

    /// Item being purchased; fixed at creation.
    item_id: ItemId,

    /// Freeze backing the order; fixed at creation.
    freeze_id: FreezeId,

    /// Unit price in minor currency units.
    price: Money,

    /// Current status of the order.
    status: OrderStatus,

    /// When the order was placed.
    created_at: DateTime<Utc>,

    /// When the order was paid. Set only together with `Paid`.
    #[serde(default)]
    paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Builds a new Pending order from a validated command.
    pub fn place(
        id: OrderId,
        cmd: &CreateOrder,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        cmd.validate()?;

        Ok(Self {
            id,
            user_id: cmd.user_id,
            item_id: cmd.item_id,
            freeze_id: cmd.freeze_id.clone(),
            price: cmd.price,
            status: OrderStatus::Pending,
            created_at,
            paid_at: None,
        })
    }

    /// Applies a status change decided by the coordinator.
    ///
    /// Only Pending orders may change, only to a terminal status, and the
    /// payment timestamp accompanies exactly the Paid transition.
    pub fn record_status(
        &mut self,
        status: OrderStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<(), OrderError> {
        if !self.status.can_transition_to(status) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: status,
            });
        }

        match (status, paid_at) {
            (OrderStatus::Paid, None) => return Err(OrderError::MissingPaymentTimestamp),
            (OrderStatus::Paid, Some(_)) => {}
            (_, Some(_)) => return Err(OrderError::UnexpectedPaymentTimestamp { status }),
            (_, None) => {}
        }

        self.status = status;
        self.paid_at = paid_at;
        Ok(())
    }

    /// Checks that the order's fields agree with each other.
    ///
    /// Covers the construction requirements plus the rule that a payment
    /// timestamp is present exactly when the order is Paid.
    pub fn validate(&self) -> Result<(), OrderError> {
        CreateOrder::new(
            self.user_id,
            self.item_id,
            self.freeze_id.clone(),
            self.price,
        )
        .validate()?;

        if self.paid_at.is_some() != (self.status == OrderStatus::Paid) {
            return Err(OrderError::PaymentTimestampMismatch {
                status: self.status,
            });
        }

        Ok(())
    }

    /// Checks whether `next` may overwrite this order's stored state.
    pub fn check_replacement(&self, next: &Order) -> Result<(), OrderError> {
        next.validate()?;

        if self.id != next.id {
            return Err(OrderError::IdMismatch {
                expected: self.id.clone(),
                actual: next.id.clone(),
            });
        }

        if self.item_id != next.item_id || self.freeze_id != next.freeze_id {
            return Err(OrderError::FreezeBindingChanged {
                order_id: self.id.clone(),
            });
        }

        if self.status.is_terminal() && (self.status != next.status || self.paid_at != next.paid_at)
        {
            return Err(OrderError::TerminalOrderChanged {
                order_id: self.id.clone(),
                status: self.status,
            });
        }

        Ok(())
    }
}

/// Wire shape of an [`Order`], checked before it becomes one.
#[derive(Deserialize)]
struct OrderRecord {
    id: OrderId,
    user_id: UserId,
    item_id: ItemId,
    freeze_id: FreezeId,
    price: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    #[serde(default)]
    paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = OrderError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let order = Self {
            id: record.id,
            user_id: record.user_id,
            item_id: record.item_id,
            freeze_id: record.freeze_id,
            price: record.price,
            status: record.status,
            created_at: record.created_at,
            paid_at: record.paid_at,
        };
        order.validate()?;
        Ok(order)
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn freeze_id(&self) -> &FreezeId {
        &self.freeze_id
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the payment timestamp, present only once the order is Paid.
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Returns true if this order is still Pending.
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }
}
