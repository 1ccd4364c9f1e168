use std::cmp::Reverse;
use std::collections::BTreeSet;

use async_trait::async_trait;

use orderdesk_core::{CustomerId, Money};
use orderdesk_products::Product;

use super::{
    status_counts, CustomerRow, CustomerSummary, DashboardStats, ListingFilter, OrderRow,
    PaymentRow, ReadViews, ShipmentRow,
};
use crate::store::{InMemoryStore, StoreError};

fn overflow(what: &str) -> StoreError {
    StoreError::Corrupt(format!("{what} overflows the money range"))
}

#[async_trait]
impl ReadViews for InMemoryStore {
    async fn order_listing(&self, filter: ListingFilter) -> Result<Vec<OrderRow>, StoreError> {
        let tables = self.tables().await;
        let mut rows: Vec<OrderRow> = tables
            .orders
            .values()
            .filter(|o| filter.admits(o.customer_id))
            .filter_map(|order| {
                let line = tables.lines.get(&order.id)?;
                let customer = tables.customers.get(&order.customer_id)?;
                let product = tables.products.get(&line.product_id)?;
                Some(OrderRow {
                    order_id: order.id,
                    order_date: order.order_date,
                    status: order.status,
                    customer_id: customer.id,
                    customer_name: customer.name.clone(),
                    customer_email: customer.email.clone(),
                    product_id: product.id,
                    product_name: product.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total(),
                })
            })
            .collect();
        rows.sort_by_key(|r| (Reverse(r.order_date), Reverse(r.order_id)));
        Ok(rows)
    }

    async fn payment_listing(&self, filter: ListingFilter) -> Result<Vec<PaymentRow>, StoreError> {
        let tables = self.tables().await;
        let mut rows: Vec<PaymentRow> = tables
            .payments
            .values()
            .filter_map(|payment| {
                let order = tables.orders.get(&payment.order_id)?;
                let customer = tables.customers.get(&order.customer_id)?;
                filter.admits(customer.id).then(|| PaymentRow {
                    payment_id: payment.id,
                    order_id: order.id,
                    customer_id: customer.id,
                    customer_name: customer.name.clone(),
                    payment_date: payment.payment_date,
                    amount: payment.amount,
                    method: payment.method,
                    status: payment.status,
                })
            })
            .collect();
        rows.sort_by_key(|r| (Reverse(r.payment_date), Reverse(r.payment_id)));
        Ok(rows)
    }

    async fn shipment_listing(
        &self,
        filter: ListingFilter,
    ) -> Result<Vec<ShipmentRow>, StoreError> {
        let tables = self.tables().await;
        let mut rows: Vec<ShipmentRow> = tables
            .shipments
            .values()
            .filter_map(|shipment| {
                let order = tables.orders.get(&shipment.order_id)?;
                let customer = tables.customers.get(&order.customer_id)?;
                filter.admits(customer.id).then(|| ShipmentRow {
                    shipment_id: shipment.id,
                    order_id: order.id,
                    customer_id: customer.id,
                    customer_name: customer.name.clone(),
                    ship_date: shipment.ship_date,
                    carrier: shipment.carrier,
                    tracking_number: shipment.tracking_number.clone(),
                    status: shipment.status,
                })
            })
            .collect();
        rows.sort_by_key(|r| (Reverse(r.ship_date), Reverse(r.shipment_id)));
        Ok(rows)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let tables = self.tables().await;

        let paid: BTreeSet<_> = tables
            .payments
            .values()
            .filter(|p| p.status.is_effective())
            .map(|p| p.order_id)
            .collect();
        let revenue = Money::checked_sum(
            tables
                .lines
                .values()
                .filter(|l| paid.contains(&l.order_id))
                .map(|l| l.line_total()),
        )
        .ok_or_else(|| overflow("revenue"))?;

        let active: BTreeSet<CustomerId> =
            tables.orders.values().map(|o| o.customer_id).collect();

        Ok(DashboardStats {
            total_orders: tables.orders.len() as u64,
            total_customers: tables.customers.len() as u64,
            total_products: tables.products.len() as u64,
            revenue,
            active_customers: active.len() as u64,
            products_in_stock: tables.products.values().filter(|p| p.in_stock()).count() as u64,
            orders_by_status: status_counts(tables.orders.values().map(|o| (o.status, 1))),
        })
    }

    async fn customer_summary(&self, customer_id: CustomerId) -> Result<CustomerSummary, StoreError> {
        let tables = self.tables().await;
        let orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .collect();
        let total_spent = Money::checked_sum(
            orders
                .iter()
                .filter_map(|o| tables.lines.get(&o.id))
                .map(|l| l.line_total()),
        )
        .ok_or_else(|| overflow("total spent"))?;

        Ok(CustomerSummary {
            customer_id,
            order_count: orders.len() as u64,
            total_spent,
            last_order_date: orders.iter().map(|o| o.order_date).max(),
        })
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let tables = self.tables().await;
        let mut products: Vec<Product> = tables.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn list_customers(&self) -> Result<Vec<CustomerRow>, StoreError> {
        let tables = self.tables().await;
        let mut rows: Vec<CustomerRow> = tables
            .customers
            .values()
            .map(|customer| CustomerRow {
                order_count: tables
                    .orders
                    .values()
                    .filter(|o| o.customer_id == customer.id)
                    .count() as u64,
                customer: customer.clone(),
            })
            .collect();
        rows.sort_by_key(|r| (Reverse(r.customer.created_at), Reverse(r.customer.id)));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Store, StoreTransaction};
    use chrono::{NaiveDate, Utc};
    use orderdesk_parties::NewCustomer;
    use orderdesk_products::{NewProduct, ProductCategory};
    use orderdesk_sales::{NewPayment, OrderLine, OrderStatus, PaymentMethod, PaymentStatus};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    async fn seeded() -> (InMemoryStore, CustomerId, CustomerId) {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let ada = tx
            .insert_customer(
                NewCustomer {
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                    phone: String::new(),
                    address: String::new(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let bob = tx
            .insert_customer(
                NewCustomer {
                    name: "Bob".to_string(),
                    email: "bob@example.com".to_string(),
                    phone: String::new(),
                    address: String::new(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let pen = tx
            .insert_product(NewProduct {
                name: "Pen".to_string(),
                description: String::new(),
                unit_price: Money::from_minor(250),
                stock: 0,
                category: ProductCategory::Other,
            })
            .await
            .unwrap();

        for (customer, qty, date) in [(ada.id, 2, day(1)), (ada.id, 1, day(3)), (bob.id, 4, day(2))] {
            let order = tx
                .insert_order(customer, date, OrderStatus::Pending)
                .await
                .unwrap();
            tx.insert_line(&OrderLine::new(order.id, pen.id, qty, Money::from_minor(250)).unwrap())
                .await
                .unwrap();
            if customer == ada.id {
                for _ in 0..2 {
                    tx.insert_payment(NewPayment {
                        order_id: order.id,
                        amount: Money::from_minor(100),
                        method: PaymentMethod::Cash,
                        payment_date: date,
                        status: PaymentStatus::Completed,
                    })
                    .await
                    .unwrap();
                }
                tx.set_order_status(order.id, OrderStatus::Processing)
                    .await
                    .unwrap();
            }
        }
        tx.commit().await.unwrap();
        (store, ada.id, bob.id)
    }

    #[tokio::test]
    async fn order_listing_is_newest_first_and_filterable() {
        let (store, ada, _) = seeded().await;

        let all = store.order_listing(ListingFilter::all()).await.unwrap();
        let dates: Vec<_> = all.iter().map(|r| r.order_date).collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);
        assert_eq!(all[1].line_total, Money::from_minor(1000));

        let mine = store
            .order_listing(ListingFilter::for_customer(ada))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|r| r.customer_id == ada));
    }

    #[tokio::test]
    async fn revenue_counts_each_paid_order_once() {
        let (store, _, _) = seeded().await;
        let stats = store.dashboard_stats().await.unwrap();

        // Ada's two orders (2 + 1 pens at 2.50), each paid twice.
        assert_eq!(stats.revenue, Money::from_minor(750));
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.active_customers, 2);
        assert_eq!(stats.products_in_stock, 0);
        assert_eq!(stats.orders_in(OrderStatus::Processing), 2);
        assert_eq!(stats.orders_in(OrderStatus::Pending), 1);
    }

    #[tokio::test]
    async fn customer_summary_totals_line_values() {
        let (store, ada, bob) = seeded().await;
        let summary = store.customer_summary(bob).await.unwrap();
        assert_eq!(summary.order_count, 1);
        assert_eq!(summary.total_spent, Money::from_minor(1000));

        let summary = store.customer_summary(ada).await.unwrap();
        assert_eq!(summary.last_order_date, Some(day(3)));
    }

    #[tokio::test]
    async fn payment_listing_respects_filter() {
        let (store, ada, bob) = seeded().await;
        assert_eq!(
            store
                .payment_listing(ListingFilter::for_customer(ada))
                .await
                .unwrap()
                .len(),
            4
        );
        assert!(
            store
                .payment_listing(ListingFilter::for_customer(bob))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn customers_list_with_order_counts() {
        let (store, _, bob) = seeded().await;
        let rows = store.list_customers().await.unwrap();
        let bob_row = rows.iter().find(|r| r.customer.id == bob).unwrap();
        assert_eq!(bob_row.order_count, 1);
    }
}
