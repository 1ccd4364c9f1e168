//! Errors surfaced to callers of the order lifecycle operations.

use thiserror::Error;

use orderdesk_core::{CustomerId, DomainError, OrderId, ProductId};
use orderdesk_inventory::InventoryError;

use crate::store::StoreError;

/// Kind of record a [`WorkflowError::NotFound`] refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Product,
    Customer,
    Order,
    OrderLine,
    Payment,
    Shipment,
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            EntityKind::Product => "product",
            EntityKind::Customer => "customer",
            EntityKind::Order => "order",
            EntityKind::OrderLine => "order line",
            EntityKind::Payment => "payment",
            EntityKind::Shipment => "shipment",
        })
    }
}

/// Failure of one lifecycle transition.
///
/// Whatever the variant, the transaction of the failed call has been rolled
/// back and no entity was changed.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("order {order_id} does not belong to customer {customer_id}")]
    OwnershipViolation {
        order_id: OrderId,
        customer_id: CustomerId,
    },

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// Refused because other records still depend on the target, or a unique
    /// value is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl WorkflowError {
    pub fn not_found(entity: EntityKind, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// True when retrying the whole call from scratch may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::StoreFailure(e) if e.is_transient())
    }
}

impl From<DomainError> for WorkflowError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => WorkflowError::Validation(msg),
            DomainError::InvalidId(msg) => WorkflowError::Validation(msg),
            DomainError::InvariantViolation(msg) => WorkflowError::PreconditionFailed(msg),
            DomainError::Conflict(msg) => WorkflowError::Conflict(msg),
        }
    }
}

impl WorkflowError {
    /// Attach the product to an inventory arithmetic failure.
    pub fn inventory(product_id: ProductId, err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientStock {
                requested,
                available,
            } => WorkflowError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            InventoryError::ZeroQuantity => {
                WorkflowError::Validation("quantity must be positive".to_string())
            }
            InventoryError::Overflow { current, quantity } => WorkflowError::Conflict(format!(
                "crediting {quantity} units to product {product_id} (stock {current}) overflows"
            )),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
