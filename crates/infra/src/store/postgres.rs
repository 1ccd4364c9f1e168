//! Postgres-backed transactional store.
//!
//! Tables follow `sql/schema.sql`. Money columns hold integer minor units and
//! enumerated columns hold the snake_case boundary strings.
//!
//! ## Locking
//!
//! Product and order reads inside a transaction use `SELECT … FOR UPDATE`, so
//! the row stays locked until the transaction settles. Stock is taken with a
//! single guarded statement:
//!
//! ```sql
//! UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1 RETURNING stock
//! ```
//!
//! which cannot drive stock below zero regardless of what the caller read
//! earlier.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (serialization failure / deadlock) | `40001`, `40P01` | `Conflict` |
//! | Database (integrity constraint) | `23xxx` | `Constraint` |
//! | Database (other) | Any other | `Unavailable` |
//! | ColumnDecode / Decode / ColumnNotFound | N/A | `Corrupt` |
//! | PoolClosed / PoolTimedOut / Io / other | N/A | `Unavailable` |

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, instrument};

use orderdesk_core::{CustomerId, Money, OrderId, PaymentId, ProductId, ShipmentId};
use orderdesk_parties::{Customer, NewCustomer};
use orderdesk_products::{NewProduct, Product};
use orderdesk_sales::{NewPayment, NewShipment, Order, OrderLine, OrderStatus, Payment, Shipment};

use super::r#trait::{Store, StoreError, StoreTransaction};
use crate::config::PostgresConfig;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Postgres-backed store.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool using the configured limits.
    #[instrument(skip(config), fields(max_connections = config.max_connections), err)]
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the tables from `sql/schema.sql` if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("apply_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTransaction;

    #[instrument(skip(self), err)]
    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresTransaction { tx })
    }
}

/// Transaction over a [`PostgresStore`]. Dropping it without commit rolls back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn insert_product(&mut self, draft: NewProduct) -> Result<Product, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, price_cents, stock, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, price_cents, stock, category
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.unit_price.minor())
        .bind(to_db_count("stock", draft.stock)?)
        .bind(draft.category.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        product_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, stock, category
            FROM products
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn update_product(&mut self, product: &Product) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, stock = $5, category = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id.get())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price.minor())
        .bind(to_db_count("stock", product.stock)?)
        .bind(product.category.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<u32>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $1
            WHERE id = $2 AND stock >= $1
            RETURNING stock
            "#,
        )
        .bind(to_db_count("quantity", quantity)?)
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", e))?;
        row.map(|r| stock_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn increment_stock(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<u32>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $1
            WHERE id = $2
            RETURNING stock
            "#,
        )
        .bind(to_db_count("quantity", quantity)?)
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("increment_stock", e))?;
        row.map(|r| stock_from_row(&r)).transpose()
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_lines_for_product(&mut self, id: ProductId) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM order_items WHERE product_id = $1")
            .bind(id.get())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("count_lines_for_product", e))?;
        count_from_row(&row)
    }

    async fn insert_customer(
        &mut self,
        draft: NewCustomer,
        created_at: DateTime<Utc>,
    ) -> Result<Customer, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (name, email, phone, address, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, phone, address, created_at
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.address)
        .bind(created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_customer", e))?;
        customer_from_row(&row)
    }

    async fn customer(&mut self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, address, created_at FROM customers WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("customer", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn customer_by_email(&mut self, email: &str) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, address, created_at FROM customers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("customer_by_email", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn update_customer(&mut self, customer: &Customer) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = $2, email = $3, phone = $4, address = $5
            WHERE id = $1
            "#,
        )
        .bind(customer.id.get())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_orders_for_customer(&mut self, id: CustomerId) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM orders WHERE customer_id = $1")
            .bind(id.get())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("count_orders_for_customer", e))?;
        count_from_row(&row)
    }

    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        order_date: NaiveDate,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (customer_id, order_date, status)
            VALUES ($1, $2, $3)
            RETURNING id, customer_id, order_date, status
            "#,
        )
        .bind(customer_id.get())
        .bind(order_date)
        .bind(status.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;
        order_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, order_date, status
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("order", e))?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.get())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_order_status", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_line(&mut self, line: &OrderLine) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(line.order_id.get())
        .bind(line.product_id.get())
        .bind(to_db_count("quantity", line.quantity)?)
        .bind(line.unit_price.minor())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_line", e))?;
        Ok(())
    }

    async fn line(&mut self, order_id: OrderId) -> Result<Option<OrderLine>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("line", e))?;
        row.as_ref().map(line_from_row).transpose()
    }

    async fn update_line(&mut self, line: &OrderLine) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE order_items
            SET product_id = $2, quantity = $3, unit_price_cents = $4
            WHERE order_id = $1
            "#,
        )
        .bind(line.order_id.get())
        .bind(line.product_id.get())
        .bind(to_db_count("quantity", line.quantity)?)
        .bind(line.unit_price.minor())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_line", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_line(&mut self, order_id: OrderId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_line", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_payment(&mut self, draft: NewPayment) -> Result<Payment, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO payments (order_id, payment_date, amount_cents, method, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, order_id, payment_date, amount_cents, method, status
            "#,
        )
        .bind(draft.order_id.get())
        .bind(draft.payment_date)
        .bind(draft.amount.minor())
        .bind(draft.method.as_str())
        .bind(draft.status.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_payment", e))?;
        payment_from_row(&row)
    }

    async fn payment(&mut self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, payment_date, amount_cents, method, status
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("payment", e))?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn payments_for_order(&mut self, order_id: OrderId) -> Result<Vec<Payment>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, payment_date, amount_cents, method, status
            FROM payments
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.get())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("payments_for_order", e))?;
        rows.iter().map(payment_from_row).collect()
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET payment_date = $3, amount_cents = $4, method = $5, status = $6
            WHERE id = $1 AND order_id = $2
            "#,
        )
        .bind(payment.id.get())
        .bind(payment.order_id.get())
        .bind(payment.payment_date)
        .bind(payment.amount.minor())
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_payment", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_payment(&mut self, id: PaymentId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_payment", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_shipment(&mut self, draft: NewShipment) -> Result<Shipment, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO shipments (order_id, ship_date, carrier, tracking_number, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, order_id, ship_date, carrier, tracking_number, status
            "#,
        )
        .bind(draft.order_id.get())
        .bind(draft.ship_date)
        .bind(draft.carrier.as_str())
        .bind(&draft.tracking_number)
        .bind(draft.status.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_shipment", e))?;
        shipment_from_row(&row)
    }

    async fn shipment(&mut self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, ship_date, carrier, tracking_number, status
            FROM shipments
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("shipment", e))?;
        row.as_ref().map(shipment_from_row).transpose()
    }

    async fn shipments_for_order(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<Shipment>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, ship_date, carrier, tracking_number, status
            FROM shipments
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.get())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("shipments_for_order", e))?;
        rows.iter().map(shipment_from_row).collect()
    }

    async fn update_shipment(&mut self, shipment: &Shipment) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE shipments
            SET ship_date = $3, carrier = $4, tracking_number = $5, status = $6
            WHERE id = $1 AND order_id = $2
            "#,
        )
        .bind(shipment.id.get())
        .bind(shipment.order_id.get())
        .bind(shipment.ship_date)
        .bind(shipment.carrier.as_str())
        .bind(&shipment.tracking_number)
        .bind(shipment.status.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_shipment", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_shipment(&mut self, id: ShipmentId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM shipments WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_shipment", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        debug!("postgres transaction committed");
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code() {
                Some(code) if code == "40001" || code == "40P01" => StoreError::Conflict(msg),
                Some(code) if code.starts_with("23") => StoreError::Constraint(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::RowNotFound => {
            StoreError::Corrupt(format!("failed to decode row in {}: {}", operation, err))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn to_db_count(column: &str, value: u32) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::Constraint(format!("{column} {value} exceeds the column range")))
}

fn from_db_count(column: &str, value: i32) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} is negative: {value}")))
}

pub(crate) fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Corrupt(format!("failed to read {column}: {e}")))
}

pub(crate) fn get_enum<T>(row: &PgRow, column: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = get(row, column)?;
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("bad {column} '{raw}': {e}")))
}

pub(crate) fn count_from_row(row: &PgRow) -> Result<u64, StoreError> {
    let n: i64 = get(row, "n")?;
    u64::try_from(n).map_err(|_| StoreError::Corrupt(format!("negative count {n}")))
}

fn stock_from_row(row: &PgRow) -> Result<u32, StoreError> {
    from_db_count("stock", get(row, "stock")?)
}

pub(crate) fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId::new(get(row, "id")?),
        name: get(row, "name")?,
        description: get(row, "description")?,
        unit_price: Money::from_minor(get(row, "price_cents")?),
        stock: from_db_count("stock", get(row, "stock")?)?,
        category: get_enum(row, "category")?,
    })
}

pub(crate) fn customer_from_row(row: &PgRow) -> Result<Customer, StoreError> {
    Ok(Customer {
        id: CustomerId::new(get(row, "id")?),
        name: get(row, "name")?,
        email: get(row, "email")?,
        phone: get(row, "phone")?,
        address: get(row, "address")?,
        created_at: get(row, "created_at")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    Ok(Order {
        id: OrderId::new(get(row, "id")?),
        customer_id: CustomerId::new(get(row, "customer_id")?),
        order_date: get(row, "order_date")?,
        status: get_enum(row, "status")?,
    })
}

fn line_from_row(row: &PgRow) -> Result<OrderLine, StoreError> {
    Ok(OrderLine {
        order_id: OrderId::new(get(row, "order_id")?),
        product_id: ProductId::new(get(row, "product_id")?),
        quantity: from_db_count("quantity", get(row, "quantity")?)?,
        unit_price: Money::from_minor(get(row, "unit_price_cents")?),
    })
}

fn payment_from_row(row: &PgRow) -> Result<Payment, StoreError> {
    Ok(Payment {
        id: PaymentId::new(get(row, "id")?),
        order_id: OrderId::new(get(row, "order_id")?),
        payment_date: get(row, "payment_date")?,
        amount: Money::from_minor(get(row, "amount_cents")?),
        method: get_enum(row, "method")?,
        status: get_enum(row, "status")?,
    })
}

fn shipment_from_row(row: &PgRow) -> Result<Shipment, StoreError> {
    Ok(Shipment {
        id: ShipmentId::new(get(row, "id")?),
        order_id: OrderId::new(get(row, "order_id")?),
        ship_date: get(row, "ship_date")?,
        carrier: get_enum(row, "carrier")?,
        tracking_number: get(row, "tracking_number")?,
        status: get_enum(row, "status")?,
    })
}
