use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderdesk_core::ValueObject;

/// Inventory arithmetic failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("stock overflow: {current} + {quantity} exceeds the representable maximum")]
    Overflow { current: u32, quantity: u32 },
}

/// Units of a product currently available for new orders.
///
/// Unsigned with checked arithmetic, so a level below zero cannot be built.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockLevel(u32);

impl ValueObject for StockLevel {}

impl StockLevel {
    pub const fn new(units: u32) -> Self {
        Self(units)
    }

    pub const fn units(self) -> u32 {
        self.0
    }

    /// Level after taking `quantity` units for an order.
    pub fn reserve(self, quantity: u32) -> Result<StockLevel, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::ZeroQuantity);
        }
        self.0
            .checked_sub(quantity)
            .map(StockLevel)
            .ok_or(InventoryError::InsufficientStock {
                requested: quantity,
                available: self.0,
            })
    }

    /// Level after crediting `quantity` units back.
    ///
    /// Nothing here remembers what was reserved; crediting the same quantity
    /// twice counts it twice.
    pub fn release(self, quantity: u32) -> Result<StockLevel, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::ZeroQuantity);
        }
        self.0
            .checked_add(quantity)
            .map(StockLevel)
            .ok_or(InventoryError::Overflow {
                current: self.0,
                quantity,
            })
    }

    pub fn covers(self, quantity: u32) -> bool {
        quantity <= self.0
    }
}

impl From<u32> for StockLevel {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
