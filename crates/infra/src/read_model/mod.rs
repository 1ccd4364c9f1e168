//! Read views: joined listings and statistics for the presentation layer.
//!
//! These are plain queries over committed data. Nothing here is consulted by
//! the lifecycle operations, and no row returned here is authoritative.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderdesk_core::{Actor, CustomerId, Money, OrderId, PaymentId, ProductId, ShipmentId};
use orderdesk_parties::Customer;
use orderdesk_products::Product;
use orderdesk_sales::{Carrier, OrderStatus, PaymentMethod, PaymentStatus, ShipmentStatus};

use crate::store::StoreError;

/// Restricts listings to one customer's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub customer_id: Option<CustomerId>,
}

impl ListingFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
        }
    }

    /// Administrators see everything, customers see their own records.
    pub fn for_actor(actor: &Actor) -> Self {
        Self {
            customer_id: actor.customer_id(),
        }
    }

    pub fn admits(&self, customer_id: CustomerId) -> bool {
        self.customer_id.is_none_or(|id| id == customer_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRow {
    pub order_id: OrderId,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_email: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Price snapshot from the order line.
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRow {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub payment_date: NaiveDate,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentRow {
    pub shipment_id: ShipmentId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub ship_date: NaiveDate,
    pub carrier: Carrier,
    pub tracking_number: String,
    pub status: ShipmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_orders: u64,
    pub total_customers: u64,
    pub total_products: u64,
    /// Line totals of orders with at least one completed payment, each order
    /// counted once however many payments it has.
    pub revenue: Money,
    /// Distinct customers with at least one order.
    pub active_customers: u64,
    pub products_in_stock: u64,
    /// One entry per status, in lifecycle order, zero counts included.
    pub orders_by_status: Vec<StatusCount>,
}

impl DashboardStats {
    pub fn orders_in(&self, status: OrderStatus) -> u64 {
        self.orders_by_status
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

/// Build the per-status list from raw `(status, count)` pairs.
pub(crate) fn status_counts<I>(pairs: I) -> Vec<StatusCount>
where
    I: IntoIterator<Item = (OrderStatus, u64)>,
{
    let mut counts: Vec<StatusCount> = OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount { status, count: 0 })
        .collect();
    for (status, n) in pairs {
        if let Some(entry) = counts.iter_mut().find(|c| c.status == status) {
            entry.count += n;
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
    pub customer_id: CustomerId,
    pub order_count: u64,
    /// Sum of line totals over all of the customer's orders.
    pub total_spent: Money,
    pub last_order_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRow {
    pub customer: Customer,
    pub order_count: u64,
}

/// Read-only queries implemented by every store backend.
#[async_trait]
pub trait ReadViews: Send + Sync {
    /// Orders joined with customer and product, newest order date first.
    async fn order_listing(&self, filter: ListingFilter) -> Result<Vec<OrderRow>, StoreError>;

    /// Payments with their customer, newest payment date first.
    async fn payment_listing(&self, filter: ListingFilter) -> Result<Vec<PaymentRow>, StoreError>;

    /// Shipments with their customer, newest ship date first.
    async fn shipment_listing(&self, filter: ListingFilter)
    -> Result<Vec<ShipmentRow>, StoreError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError>;

    async fn customer_summary(&self, customer_id: CustomerId) -> Result<CustomerSummary, StoreError>;

    /// Products by name.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Customers newest first, with their order counts.
    async fn list_customers(&self) -> Result<Vec<CustomerRow>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_for_actor() {
        assert_eq!(ListingFilter::for_actor(&Actor::Admin), ListingFilter::all());
        let f = ListingFilter::for_actor(&Actor::Customer(CustomerId::new(3)));
        assert!(f.admits(CustomerId::new(3)));
        assert!(!f.admits(CustomerId::new(4)));
        assert!(ListingFilter::all().admits(CustomerId::new(4)));
    }

    #[test]
    fn status_counts_cover_every_status() {
        let counts = status_counts([(OrderStatus::Pending, 2), (OrderStatus::Shipped, 1)]);
        assert_eq!(counts.len(), OrderStatus::ALL.len());
        assert_eq!(counts[0], StatusCount { status: OrderStatus::Pending, count: 2 });
        assert_eq!(counts[1].count, 0);
        assert_eq!(counts[2].count, 1);
    }
}
