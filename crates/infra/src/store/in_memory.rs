use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

use orderdesk_core::{CustomerId, Entity, OrderId, PaymentId, ProductId, ShipmentId};
use orderdesk_parties::{Customer, NewCustomer};
use orderdesk_products::{NewProduct, Product};
use orderdesk_sales::{NewPayment, NewShipment, Order, OrderLine, OrderStatus, Payment, Shipment};

use super::r#trait::{Store, StoreError, StoreTransaction};

/// Store operation at which a one-shot fault can be armed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    DecrementStock,
    IncrementStock,
    InsertOrder,
    SetOrderStatus,
    DeleteOrder,
    InsertLine,
    UpdateLine,
    DeleteLine,
    InsertPayment,
    UpdatePayment,
    DeletePayment,
    InsertShipment,
    UpdateShipment,
    DeleteShipment,
    Commit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Tables {
    last_id: i64,
    pub(crate) products: BTreeMap<ProductId, Product>,
    pub(crate) customers: BTreeMap<CustomerId, Customer>,
    pub(crate) orders: BTreeMap<OrderId, Order>,
    pub(crate) lines: BTreeMap<OrderId, OrderLine>,
    pub(crate) payments: BTreeMap<PaymentId, Payment>,
    pub(crate) shipments: BTreeMap<ShipmentId, Shipment>,
}

/// Insert or replace a row under its own id.
fn put<E>(table: &mut BTreeMap<E::Id, E>, row: &E)
where
    E: Entity + Clone,
    E::Id: Ord,
{
    table.insert(row.id(), row.clone());
}

impl Tables {
    // One counter for every table, like a shared sequence.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory transactional store.
///
/// Intended for tests/dev. A transaction holds the store's only lock from
/// `begin` until it settles, so transactions are fully serialised and a
/// check-then-act sequence inside one of them cannot interleave with another.
/// Writes go to a working copy that replaces the tables on commit.
///
/// Enforces the same referential rules as `sql/schema.sql`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    fault: Arc<StdMutex<Option<FaultPoint>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot fault: the next transaction that reaches `point` fails
    /// with [`StoreError::Injected`] and the fault disarms itself.
    pub fn fail_at(&self, point: FaultPoint) {
        if let Ok(mut armed) = self.fault.lock() {
            *armed = Some(point);
        }
    }

    pub(crate) async fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().await
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(InMemoryTransaction {
            guard,
            work,
            fault: self.fault.clone(),
        })
    }
}

/// Transaction over an [`InMemoryStore`].
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    fault: Arc<StdMutex<Option<FaultPoint>>>,
}

impl InMemoryTransaction {
    fn trip(&self, point: FaultPoint) -> Result<(), StoreError> {
        let mut armed = self
            .fault
            .lock()
            .map_err(|_| StoreError::Unavailable("fault lock poisoned".to_string()))?;
        if *armed == Some(point) {
            *armed = None;
            return Err(StoreError::Injected(point));
        }
        Ok(())
    }

    fn email_taken(&self, email: &str, except: Option<CustomerId>) -> bool {
        self.work
            .customers
            .values()
            .any(|c| c.email == email && Some(c.id) != except)
    }
}

fn constraint(msg: impl Into<String>) -> StoreError {
    StoreError::Constraint(msg.into())
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn insert_product(&mut self, draft: NewProduct) -> Result<Product, StoreError> {
        let id = ProductId::new(self.work.next_id());
        let product = Product::from_draft(id, draft);
        put(&mut self.work.products, &product);
        Ok(product)
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.work.products.get(&id).cloned())
    }

    async fn update_product(&mut self, product: &Product) -> Result<bool, StoreError> {
        match self.work.products.get_mut(&product.id) {
            Some(row) => {
                *row = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<u32>, StoreError> {
        self.trip(FaultPoint::DecrementStock)?;
        let Some(product) = self.work.products.get_mut(&id) else {
            return Ok(None);
        };
        match product.stock.checked_sub(quantity) {
            Some(remaining) => {
                product.stock = remaining;
                Ok(Some(remaining))
            }
            None => Ok(None),
        }
    }

    async fn increment_stock(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<u32>, StoreError> {
        self.trip(FaultPoint::IncrementStock)?;
        let Some(product) = self.work.products.get_mut(&id) else {
            return Ok(None);
        };
        let level = product
            .stock
            .checked_add(quantity)
            .ok_or_else(|| constraint(format!("stock of product {id} would overflow")))?;
        product.stock = level;
        Ok(Some(level))
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError> {
        if self.work.lines.values().any(|l| l.product_id == id) {
            return Err(constraint(format!("product {id} is referenced by order lines")));
        }
        Ok(self.work.products.remove(&id).is_some())
    }

    async fn count_lines_for_product(&mut self, id: ProductId) -> Result<u64, StoreError> {
        Ok(self.work.lines.values().filter(|l| l.product_id == id).count() as u64)
    }

    async fn insert_customer(
        &mut self,
        draft: NewCustomer,
        created_at: DateTime<Utc>,
    ) -> Result<Customer, StoreError> {
        if self.email_taken(&draft.email, None) {
            return Err(constraint(format!("email '{}' already registered", draft.email)));
        }
        let id = CustomerId::new(self.work.next_id());
        let customer = Customer::from_draft(id, draft, created_at);
        put(&mut self.work.customers, &customer);
        Ok(customer)
    }

    async fn customer(&mut self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(self.work.customers.get(&id).cloned())
    }

    async fn customer_by_email(&mut self, email: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self
            .work
            .customers
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn update_customer(&mut self, customer: &Customer) -> Result<bool, StoreError> {
        if self.email_taken(&customer.email, Some(customer.id)) {
            return Err(constraint(format!(
                "email '{}' already registered",
                customer.email
            )));
        }
        match self.work.customers.get_mut(&customer.id) {
            Some(row) => {
                *row = customer.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool, StoreError> {
        if self.work.orders.values().any(|o| o.customer_id == id) {
            return Err(constraint(format!("customer {id} is referenced by orders")));
        }
        Ok(self.work.customers.remove(&id).is_some())
    }

    async fn count_orders_for_customer(&mut self, id: CustomerId) -> Result<u64, StoreError> {
        Ok(self
            .work
            .orders
            .values()
            .filter(|o| o.customer_id == id)
            .count() as u64)
    }

    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        order_date: NaiveDate,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        self.trip(FaultPoint::InsertOrder)?;
        if !self.work.customers.contains_key(&customer_id) {
            return Err(constraint(format!("customer {customer_id} does not exist")));
        }
        let order = Order {
            id: OrderId::new(self.work.next_id()),
            customer_id,
            order_date,
            status,
        };
        put(&mut self.work.orders, &order);
        Ok(order)
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        self.trip(FaultPoint::SetOrderStatus)?;
        match self.work.orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool, StoreError> {
        self.trip(FaultPoint::DeleteOrder)?;
        let referenced = self.work.lines.contains_key(&id)
            || self.work.payments.values().any(|p| p.order_id == id)
            || self.work.shipments.values().any(|s| s.order_id == id);
        if referenced {
            return Err(constraint(format!("order {id} still has dependent rows")));
        }
        Ok(self.work.orders.remove(&id).is_some())
    }

    async fn insert_line(&mut self, line: &OrderLine) -> Result<(), StoreError> {
        self.trip(FaultPoint::InsertLine)?;
        if !self.work.orders.contains_key(&line.order_id) {
            return Err(constraint(format!("order {} does not exist", line.order_id)));
        }
        if !self.work.products.contains_key(&line.product_id) {
            return Err(constraint(format!("product {} does not exist", line.product_id)));
        }
        if self.work.lines.contains_key(&line.order_id) {
            return Err(constraint(format!("order {} already has a line", line.order_id)));
        }
        self.work.lines.insert(line.order_id, line.clone());
        Ok(())
    }

    async fn line(&mut self, order_id: OrderId) -> Result<Option<OrderLine>, StoreError> {
        Ok(self.work.lines.get(&order_id).cloned())
    }

    async fn update_line(&mut self, line: &OrderLine) -> Result<bool, StoreError> {
        self.trip(FaultPoint::UpdateLine)?;
        if !self.work.products.contains_key(&line.product_id) {
            return Err(constraint(format!("product {} does not exist", line.product_id)));
        }
        match self.work.lines.get_mut(&line.order_id) {
            Some(row) => {
                *row = line.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_line(&mut self, order_id: OrderId) -> Result<bool, StoreError> {
        self.trip(FaultPoint::DeleteLine)?;
        Ok(self.work.lines.remove(&order_id).is_some())
    }

    async fn insert_payment(&mut self, draft: NewPayment) -> Result<Payment, StoreError> {
        self.trip(FaultPoint::InsertPayment)?;
        if !self.work.orders.contains_key(&draft.order_id) {
            return Err(constraint(format!("order {} does not exist", draft.order_id)));
        }
        let payment = Payment::from_draft(PaymentId::new(self.work.next_id()), draft);
        put(&mut self.work.payments, &payment);
        Ok(payment)
    }

    async fn payment(&mut self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        Ok(self.work.payments.get(&id).cloned())
    }

    async fn payments_for_order(&mut self, order_id: OrderId) -> Result<Vec<Payment>, StoreError> {
        Ok(self
            .work
            .payments
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<bool, StoreError> {
        self.trip(FaultPoint::UpdatePayment)?;
        match self.work.payments.get_mut(&payment.id) {
            Some(row) if row.order_id == payment.order_id => {
                *row = payment.clone();
                Ok(true)
            }
            Some(_) => Err(constraint(format!(
                "payment {} cannot move to another order",
                payment.id
            ))),
            None => Ok(false),
        }
    }

    async fn delete_payment(&mut self, id: PaymentId) -> Result<bool, StoreError> {
        self.trip(FaultPoint::DeletePayment)?;
        Ok(self.work.payments.remove(&id).is_some())
    }

    async fn insert_shipment(&mut self, draft: NewShipment) -> Result<Shipment, StoreError> {
        self.trip(FaultPoint::InsertShipment)?;
        if !self.work.orders.contains_key(&draft.order_id) {
            return Err(constraint(format!("order {} does not exist", draft.order_id)));
        }
        let shipment = Shipment::from_draft(ShipmentId::new(self.work.next_id()), draft);
        put(&mut self.work.shipments, &shipment);
        Ok(shipment)
    }

    async fn shipment(&mut self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        Ok(self.work.shipments.get(&id).cloned())
    }

    async fn shipments_for_order(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<Shipment>, StoreError> {
        Ok(self
            .work
            .shipments
            .values()
            .filter(|s| s.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_shipment(&mut self, shipment: &Shipment) -> Result<bool, StoreError> {
        self.trip(FaultPoint::UpdateShipment)?;
        match self.work.shipments.get_mut(&shipment.id) {
            Some(row) if row.order_id == shipment.order_id => {
                *row = shipment.clone();
                Ok(true)
            }
            Some(_) => Err(constraint(format!(
                "shipment {} cannot move to another order",
                shipment.id
            ))),
            None => Ok(false),
        }
    }

    async fn delete_shipment(&mut self, id: ShipmentId) -> Result<bool, StoreError> {
        self.trip(FaultPoint::DeleteShipment)?;
        Ok(self.work.shipments.remove(&id).is_some())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.trip(FaultPoint::Commit)?;
        let InMemoryTransaction { mut guard, work, .. } = self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
