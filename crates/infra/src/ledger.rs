//! Inventory Ledger: product stock reserve/release inside a transaction.

use tracing::instrument;

use orderdesk_core::ProductId;
use orderdesk_inventory::StockLevel;
use orderdesk_products::Product;

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::store::StoreTransaction;

/// Outcome of a successful reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// Product row as read under lock, before the decrement. Its price is the
    /// one to snapshot into an order line.
    pub product: Product,
    pub quantity: u32,
    pub remaining: u32,
}

pub struct InventoryLedger;

impl InventoryLedger {
    /// Take `quantity` units of `product_id`.
    ///
    /// The product row is read with a lock and the decrement is a
    /// compare-and-decrement, so two transactions cannot both take the last
    /// units.
    #[instrument(skip(tx), err)]
    pub async fn reserve<T>(
        tx: &mut T,
        product_id: ProductId,
        quantity: u32,
    ) -> WorkflowResult<Reservation>
    where
        T: StoreTransaction + ?Sized,
    {
        let product = tx
            .product(product_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Product, product_id))?;

        let level = StockLevel::new(product.stock)
            .reserve(quantity)
            .map_err(|e| WorkflowError::inventory(product_id, e))?;

        let remaining = tx
            .decrement_stock(product_id, quantity)
            .await?
            .ok_or(WorkflowError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            })?;

        debug_assert_eq!(remaining, level.units());
        Ok(Reservation {
            product,
            quantity,
            remaining,
        })
    }

    /// Credit `quantity` units back to `product_id`.
    ///
    /// Nothing records that a reservation was already released; callers
    /// release exactly once per reserved quantity.
    #[instrument(skip(tx), err)]
    pub async fn release<T>(tx: &mut T, product_id: ProductId, quantity: u32) -> WorkflowResult<u32>
    where
        T: StoreTransaction + ?Sized,
    {
        if quantity == 0 {
            return Err(WorkflowError::Validation("quantity must be positive".to_string()));
        }
        tx.increment_stock(product_id, quantity)
            .await?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Product, product_id))
    }
}
