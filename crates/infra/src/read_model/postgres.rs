//! Postgres-backed read views.
//!
//! Plain pool queries outside any lifecycle transaction; they see committed
//! data only.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use tracing::instrument;

use orderdesk_core::{CustomerId, Money, OrderId, PaymentId, ProductId, ShipmentId};
use orderdesk_products::Product;

use super::{
    status_counts, CustomerRow, CustomerSummary, DashboardStats, ListingFilter, OrderRow,
    PaymentRow, ReadViews, ShipmentRow,
};
use crate::store::postgres::{
    count_from_row, customer_from_row, get, get_enum, map_sqlx_error, product_from_row,
};
use crate::store::{PostgresStore, StoreError};

fn cents(row: &PgRow, column: &str) -> Result<Money, StoreError> {
    Ok(Money::from_minor(get(row, column)?))
}

fn count(row: &PgRow, column: &str) -> Result<u64, StoreError> {
    let n: i64 = get(row, column)?;
    u64::try_from(n).map_err(|_| StoreError::Corrupt(format!("negative {column}: {n}")))
}

fn customer_filter(filter: &ListingFilter) -> Option<i64> {
    filter.customer_id.map(|id| id.get())
}

fn order_row(row: &PgRow) -> Result<OrderRow, StoreError> {
    let quantity: i32 = get(row, "quantity")?;
    Ok(OrderRow {
        order_id: OrderId::new(get(row, "order_id")?),
        order_date: get(row, "order_date")?,
        status: get_enum(row, "status")?,
        customer_id: CustomerId::new(get(row, "customer_id")?),
        customer_name: get(row, "customer_name")?,
        customer_email: get(row, "customer_email")?,
        product_id: ProductId::new(get(row, "product_id")?),
        product_name: get(row, "product_name")?,
        quantity: u32::try_from(quantity)
            .map_err(|_| StoreError::Corrupt(format!("negative quantity {quantity}")))?,
        unit_price: cents(row, "unit_price_cents")?,
        line_total: cents(row, "line_total_cents")?,
    })
}

#[async_trait]
impl ReadViews for PostgresStore {
    #[instrument(skip(self), err)]
    async fn order_listing(&self, filter: ListingFilter) -> Result<Vec<OrderRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                o.id AS order_id,
                o.order_date,
                o.status,
                c.id AS customer_id,
                c.name AS customer_name,
                c.email AS customer_email,
                p.id AS product_id,
                p.name AS product_name,
                oi.quantity,
                oi.unit_price_cents,
                oi.quantity::BIGINT * oi.unit_price_cents AS line_total_cents
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            JOIN order_items oi ON oi.order_id = o.id
            JOIN products p ON p.id = oi.product_id
            WHERE $1::BIGINT IS NULL OR o.customer_id = $1
            ORDER BY o.order_date DESC, o.id DESC
            "#,
        )
        .bind(customer_filter(&filter))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("order_listing", e))?;
        rows.iter().map(order_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn payment_listing(&self, filter: ListingFilter) -> Result<Vec<PaymentRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                pay.id, pay.order_id, pay.payment_date, pay.amount_cents, pay.method, pay.status,
                c.id AS customer_id, c.name AS customer_name
            FROM payments pay
            JOIN orders o ON o.id = pay.order_id
            JOIN customers c ON c.id = o.customer_id
            WHERE $1::BIGINT IS NULL OR o.customer_id = $1
            ORDER BY pay.payment_date DESC, pay.id DESC
            "#,
        )
        .bind(customer_filter(&filter))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("payment_listing", e))?;

        rows.iter()
            .map(|row| {
                Ok(PaymentRow {
                    payment_id: PaymentId::new(get(row, "id")?),
                    order_id: OrderId::new(get(row, "order_id")?),
                    customer_id: CustomerId::new(get(row, "customer_id")?),
                    customer_name: get(row, "customer_name")?,
                    payment_date: get(row, "payment_date")?,
                    amount: cents(row, "amount_cents")?,
                    method: get_enum(row, "method")?,
                    status: get_enum(row, "status")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn shipment_listing(
        &self,
        filter: ListingFilter,
    ) -> Result<Vec<ShipmentRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                s.id, s.order_id, s.ship_date, s.carrier, s.tracking_number, s.status,
                c.id AS customer_id, c.name AS customer_name
            FROM shipments s
            JOIN orders o ON o.id = s.order_id
            JOIN customers c ON c.id = o.customer_id
            WHERE $1::BIGINT IS NULL OR o.customer_id = $1
            ORDER BY s.ship_date DESC, s.id DESC
            "#,
        )
        .bind(customer_filter(&filter))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("shipment_listing", e))?;

        rows.iter()
            .map(|row| {
                Ok(ShipmentRow {
                    shipment_id: ShipmentId::new(get(row, "id")?),
                    order_id: OrderId::new(get(row, "order_id")?),
                    customer_id: CustomerId::new(get(row, "customer_id")?),
                    customer_name: get(row, "customer_name")?,
                    ship_date: get(row, "ship_date")?,
                    carrier: get_enum(row, "carrier")?,
                    tracking_number: get(row, "tracking_number")?,
                    status: get_enum(row, "status")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let totals = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(*) FROM customers) AS total_customers,
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(DISTINCT customer_id) FROM orders) AS active_customers,
                (SELECT COUNT(*) FROM products WHERE stock > 0) AS products_in_stock,
                (
                    SELECT COALESCE(SUM(oi.quantity::BIGINT * oi.unit_price_cents), 0)::BIGINT
                    FROM order_items oi
                    WHERE EXISTS (
                        SELECT 1 FROM payments pay
                        WHERE pay.order_id = oi.order_id AND pay.status = 'completed'
                    )
                ) AS revenue_cents
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("dashboard_stats", e))?;

        let by_status = sqlx::query("SELECT status, COUNT(*) AS n FROM orders GROUP BY status")
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("dashboard_stats", e))?;
        let pairs = by_status
            .iter()
            .map(|row| Ok((get_enum(row, "status")?, count_from_row(row)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(DashboardStats {
            total_orders: count(&totals, "total_orders")?,
            total_customers: count(&totals, "total_customers")?,
            total_products: count(&totals, "total_products")?,
            revenue: cents(&totals, "revenue_cents")?,
            active_customers: count(&totals, "active_customers")?,
            products_in_stock: count(&totals, "products_in_stock")?,
            orders_by_status: status_counts(pairs),
        })
    }

    #[instrument(skip(self), err)]
    async fn customer_summary(&self, customer_id: CustomerId) -> Result<CustomerSummary, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(o.id) AS order_count,
                COALESCE(SUM(oi.quantity::BIGINT * oi.unit_price_cents), 0)::BIGINT AS spent_cents,
                MAX(o.order_date) AS last_order_date
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.customer_id = $1
            "#,
        )
        .bind(customer_id.get())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("customer_summary", e))?;

        Ok(CustomerSummary {
            customer_id,
            order_count: count(&row, "order_count")?,
            total_spent: cents(&row, "spent_cents")?,
            last_order_date: get(&row, "last_order_date")?,
        })
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, stock, category
            FROM products
            ORDER BY name, id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_customers(&self) -> Result<Vec<CustomerRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                c.id, c.name, c.email, c.phone, c.address, c.created_at,
                (SELECT COUNT(*) FROM orders o WHERE o.customer_id = c.id) AS n
            FROM customers c
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_customers", e))?;

        rows.iter()
            .map(|row| {
                Ok(CustomerRow {
                    customer: customer_from_row(row)?,
                    order_count: count_from_row(row)?,
                })
            })
            .collect()
    }
}
