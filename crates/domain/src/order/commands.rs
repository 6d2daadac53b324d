//! Order commands.

use common::{FreezeId, ItemId, UserId};

use super::{Money, OrderError};

/// Command to place a new order against a previously frozen inventory unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    /// The user placing the order.
    pub user_id: UserId,

    /// The item being purchased.
    pub item_id: ItemId,

    /// The freeze reserving one unit of the item for this order.
    pub freeze_id: FreezeId,

    /// Unit price in minor currency units.
    pub price: Money,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(
        user_id: impl Into<UserId>,
        item_id: impl Into<ItemId>,
        freeze_id: impl Into<FreezeId>,
        price: impl Into<Money>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            freeze_id: freeze_id.into(),
            price: price.into(),
        }
    }

    /// Checks the construction requirements of an order.
    pub fn validate(&self) -> Result<(), OrderError> {
        if !self.user_id.is_set() {
            return Err(OrderError::UserIdRequired);
        }
        if !self.item_id.is_set() {
            return Err(OrderError::ItemIdRequired);
        }
        if self.freeze_id.is_blank() {
            return Err(OrderError::FreezeIdRequired);
        }
        if self.price.is_negative() {
            return Err(OrderError::NegativePrice {
                price: self.price.minor_units(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_command() {
        let cmd = CreateOrder::new(1, 42, "f-1", 500);
        assert_eq!(cmd.validate(), Ok(()));
    }

    #[test]
    fn test_zero_price_is_allowed() {
        assert_eq!(CreateOrder::new(1, 42, "f-1", 0).validate(), Ok(()));
    }

    #[test]
    fn test_missing_user() {
        let cmd = CreateOrder::new(0, 42, "f-1", 500);
        assert_eq!(cmd.validate(), Err(OrderError::UserIdRequired));
    }

    #[test]
    fn test_missing_item() {
        let cmd = CreateOrder::new(1, 0, "f-1", 500);
        assert_eq!(cmd.validate(), Err(OrderError::ItemIdRequired));
    }

    #[test]
    fn test_blank_freeze() {
        let cmd = CreateOrder::new(1, 42, "  ", 500);
        assert_eq!(cmd.validate(), Err(OrderError::FreezeIdRequired));
    }

    #[test]
    fn test_negative_price() {
        let cmd = CreateOrder::new(1, 42, "f-1", -1);
        assert_eq!(cmd.validate(), Err(OrderError::NegativePrice { price: -1 }));
    }
}
