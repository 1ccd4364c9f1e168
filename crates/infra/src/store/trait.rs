use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use orderdesk_core::{CustomerId, OrderId, PaymentId, ProductId, ShipmentId};
use orderdesk_parties::{Customer, NewCustomer};
use orderdesk_products::{NewProduct, Product};
use orderdesk_sales::{NewPayment, NewShipment, Order, OrderLine, OrderStatus, Payment, Shipment};

/// Store operation error.
///
/// These are **infrastructure errors** (locking, constraints, connectivity) as
/// opposed to domain errors (validation, invariants). A transition that hits
/// one of these is rolled back as a whole.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Serialization failure or deadlock; retrying the whole transition may succeed.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// Unique, foreign-key or check constraint rejected a write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The backend could not be reached (pool closed, IO, timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// A fault armed through [`crate::store::InMemoryStore::fail_at`].
    #[error("injected fault at {0:?}")]
    Injected(crate::store::FaultPoint),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict(_) | StoreError::Unavailable(_) | StoreError::Injected(_)
        )
    }
}

/// Transactional store.
///
/// Every core operation opens exactly one transaction, performs its reads and
/// writes through it, then commits or rolls back. Reads made through a
/// transaction that feed a decision (stock level, order status) are locking
/// reads: a concurrent transaction touching the same row waits until this one
/// settles.
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: StoreTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

#[async_trait]
impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    type Tx = S::Tx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        (**self).begin().await
    }
}

/// Row-level operations available inside one transaction.
///
/// Lookups return `Ok(None)` for a missing row; mutations of a single row by id
/// return `Ok(false)` when nothing matched. Dropping a transaction without
/// calling [`StoreTransaction::commit`] discards all of its writes.
#[async_trait]
pub trait StoreTransaction: Send {
    // Products

    async fn insert_product(&mut self, draft: NewProduct) -> Result<Product, StoreError>;

    /// Locking read of a product row.
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn update_product(&mut self, product: &Product) -> Result<bool, StoreError>;

    /// Compare-and-decrement: take `quantity` units only if at least that many
    /// are in stock. Returns the remaining level, or `None` when the product is
    /// missing or short.
    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<u32>, StoreError>;

    /// Credit `quantity` units back. Returns the new level, or `None` when the
    /// product is missing.
    async fn increment_stock(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<u32>, StoreError>;

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError>;

    async fn count_lines_for_product(&mut self, id: ProductId) -> Result<u64, StoreError>;

    // Customers

    async fn insert_customer(
        &mut self,
        draft: NewCustomer,
        created_at: DateTime<Utc>,
    ) -> Result<Customer, StoreError>;

    async fn customer(&mut self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    /// Lookup by normalised email.
    async fn customer_by_email(&mut self, email: &str) -> Result<Option<Customer>, StoreError>;

    async fn update_customer(&mut self, customer: &Customer) -> Result<bool, StoreError>;

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool, StoreError>;

    async fn count_orders_for_customer(&mut self, id: CustomerId) -> Result<u64, StoreError>;

    // Orders

    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        order_date: NaiveDate,
        status: OrderStatus,
    ) -> Result<Order, StoreError>;

    /// Locking read of an order header.
    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, StoreError>;

    async fn delete_order(&mut self, id: OrderId) -> Result<bool, StoreError>;

    // Order lines

    async fn insert_line(&mut self, line: &OrderLine) -> Result<(), StoreError>;

    async fn line(&mut self, order_id: OrderId) -> Result<Option<OrderLine>, StoreError>;

    async fn update_line(&mut self, line: &OrderLine) -> Result<bool, StoreError>;

    async fn delete_line(&mut self, order_id: OrderId) -> Result<bool, StoreError>;

    // Payments

    async fn insert_payment(&mut self, draft: NewPayment) -> Result<Payment, StoreError>;

    async fn payment(&mut self, id: PaymentId) -> Result<Option<Payment>, StoreError>;

    async fn payments_for_order(&mut self, order_id: OrderId) -> Result<Vec<Payment>, StoreError>;

    /// Rewrite amount, method, date and status. The order reference is fixed.
    async fn update_payment(&mut self, payment: &Payment) -> Result<bool, StoreError>;

    async fn delete_payment(&mut self, id: PaymentId) -> Result<bool, StoreError>;

    // Shipments

    async fn insert_shipment(&mut self, draft: NewShipment) -> Result<Shipment, StoreError>;

    async fn shipment(&mut self, id: ShipmentId) -> Result<Option<Shipment>, StoreError>;

    async fn shipments_for_order(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<Shipment>, StoreError>;

    /// Rewrite carrier, tracking number, date and status. The order
    /// reference is fixed.
    async fn update_shipment(&mut self, shipment: &Shipment) -> Result<bool, StoreError>;

    async fn delete_shipment(&mut self, id: ShipmentId) -> Result<bool, StoreError>;

    // Settlement

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
