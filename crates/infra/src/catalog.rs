//! Catalog administration: products and customers.

use chrono::Utc;
use tracing::instrument;

use orderdesk_core::{CustomerId, ProductId};
use orderdesk_parties::{Customer, NewCustomer};
use orderdesk_products::{NewProduct, Product};

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::store::{Store, StoreError, StoreTransaction};
use crate::workflow::settle;

fn email_conflict(email: &str) -> WorkflowError {
    WorkflowError::Conflict(format!("email '{email}' is already registered"))
}

/// A customer write can only break the unique email constraint.
fn email_taken(email: &str) -> impl FnOnce(StoreError) -> WorkflowError + '_ {
    move |err| match err {
        StoreError::Constraint(_) => email_conflict(email),
        other => other.into(),
    }
}

#[derive(Debug, Clone)]
pub struct Catalog<S> {
    store: S,
}

impl<S> Catalog<S>
where
    S: Store,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    pub async fn create_product(&self, draft: NewProduct) -> WorkflowResult<Product> {
        let draft = draft.validate()?;
        let mut tx = self.store.begin().await?;
        let result = tx.insert_product(draft).await.map_err(WorkflowError::from);
        settle(tx, "create_product", result).await
    }

    /// Replace every field, stock included (administrative restock).
    ///
    /// Existing order lines keep their price snapshot.
    #[instrument(skip(self, draft), err)]
    pub async fn update_product(&self, id: ProductId, draft: NewProduct) -> WorkflowResult<Product> {
        let draft = draft.validate()?;
        let mut tx = self.store.begin().await?;
        let result = async {
            if tx.product(id).await?.is_none() {
                return Err(WorkflowError::not_found(EntityKind::Product, id));
            }
            let product = Product::from_draft(id, draft);
            tx.update_product(&product).await?;
            Ok(product)
        }
        .await;
        settle(tx, "update_product", result).await
    }

    /// Refused while any order line references the product.
    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, id: ProductId) -> WorkflowResult<()> {
        let mut tx = self.store.begin().await?;
        let result = async {
            if tx.product(id).await?.is_none() {
                return Err(WorkflowError::not_found(EntityKind::Product, id));
            }
            let lines = tx.count_lines_for_product(id).await?;
            if lines > 0 {
                return Err(WorkflowError::Conflict(format!(
                    "product {id} is referenced by {lines} order line(s)"
                )));
            }
            tx.delete_product(id).await?;
            Ok(())
        }
        .await;
        settle(tx, "delete_product", result).await
    }

    /// Register a customer. Emails are unique, compared case-insensitively.
    #[instrument(skip(self, draft), err)]
    pub async fn register_customer(&self, draft: NewCustomer) -> WorkflowResult<Customer> {
        let draft = draft.validate()?;
        let mut tx = self.store.begin().await?;
        let result = async {
            if tx.customer_by_email(&draft.email).await?.is_some() {
                return Err(email_conflict(&draft.email));
            }
            let email = draft.email.clone();
            tx.insert_customer(draft, Utc::now())
                .await
                .map_err(email_taken(&email))
        }
        .await;
        settle(tx, "register_customer", result).await
    }

    #[instrument(skip(self, draft), err)]
    pub async fn update_customer(&self, id: CustomerId, draft: NewCustomer) -> WorkflowResult<Customer> {
        let draft = draft.validate()?;
        let mut tx = self.store.begin().await?;
        let result = async {
            let mut customer = tx
                .customer(id)
                .await?
                .ok_or_else(|| WorkflowError::not_found(EntityKind::Customer, id))?;
            if let Some(holder) = tx.customer_by_email(&draft.email).await? {
                if holder.id != id {
                    return Err(email_conflict(&draft.email));
                }
            }
            customer.apply_update(draft);
            tx.update_customer(&customer)
                .await
                .map_err(email_taken(&customer.email))?;
            Ok(customer)
        }
        .await;
        settle(tx, "update_customer", result).await
    }

    /// Refused while any order references the customer.
    #[instrument(skip(self), err)]
    pub async fn delete_customer(&self, id: CustomerId) -> WorkflowResult<()> {
        let mut tx = self.store.begin().await?;
        let result = async {
            if tx.customer(id).await?.is_none() {
                return Err(WorkflowError::not_found(EntityKind::Customer, id));
            }
            let orders = tx.count_orders_for_customer(id).await?;
            if orders > 0 {
                return Err(WorkflowError::Conflict(format!(
                    "customer {id} has {orders} order(s)"
                )));
            }
            tx.delete_customer(id).await?;
            Ok(())
        }
        .await;
        settle(tx, "delete_customer", result).await
    }
}
