//! Order Workflow Engine.
//!
//! Each operation is one transition: open a transaction, run the steps
//! through the ledger, the order book and the recorders, then commit. Any
//! failure rolls the whole transaction back, including stock already taken,
//! and is returned to the caller unchanged.
//!
//! ```text
//! create_order    ── reserve stock, insert order + line           → pending
//! record_payment  ── insert payment (completed)                   → processing
//! record_shipment ── insert shipment                              → shipped
//! update_payment  ── rewrite payment (now completed)             → processing
//! update_order_status / update_shipment ── override             → delivered | cancelled | returned
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use orderdesk_core::{Actor, CustomerId, Money, OrderId, PaymentId, ProductId, ShipmentId};
use orderdesk_sales::{NewPayment, NewShipment, Order, OrderStatus, Payment, Shipment, ShipmentStatus};

use crate::error::{WorkflowError, WorkflowResult};
use crate::orders::{OrderBook, OrderRecord, OrderRemoval};
use crate::payments::{PaymentRecorder, RecordedPayment};
use crate::shipments::{RecordedShipment, ShipmentRecorder};
use crate::store::{Store, StoreTransaction};

/// Request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub order_date: NaiveDate,
}

/// Administrative replacement of an order's line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineUpdate {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Commit on success, roll back on failure.
pub(crate) async fn settle<T, R>(
    tx: T,
    operation: &'static str,
    result: WorkflowResult<R>,
) -> WorkflowResult<R>
where
    T: StoreTransaction,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            debug!(operation, "transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(operation, error = %rollback, "rollback failed; dropping transaction");
            }
            warn!(operation, error = %err, "transaction rolled back");
            Err(err)
        }
    }
}

/// Entry point for order lifecycle transitions.
#[derive(Debug, Clone)]
pub struct OrderWorkflow<S> {
    store: S,
}

impl<S> OrderWorkflow<S>
where
    S: Store,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Place an order.
    ///
    /// Customers may only order for themselves.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, product_id = %request.product_id, quantity = request.quantity), err)]
    pub async fn create_order(&self, actor: &Actor, request: NewOrder) -> WorkflowResult<OrderRecord> {
        if let Some(customer_id) = actor.customer_id() {
            if customer_id != request.customer_id {
                return Err(WorkflowError::PreconditionFailed(format!(
                    "customer {customer_id} cannot order on behalf of customer {}",
                    request.customer_id
                )));
            }
        }

        let mut tx = self.store.begin().await?;
        let result = OrderBook::create(
            &mut tx,
            request.customer_id,
            request.product_id,
            request.quantity,
            request.order_date,
        )
        .await;
        settle(tx, "create_order", result).await
    }

    #[instrument(skip(self, draft), fields(order_id = %draft.order_id), err)]
    pub async fn record_payment(&self, actor: &Actor, draft: NewPayment) -> WorkflowResult<RecordedPayment> {
        let mut tx = self.store.begin().await?;
        let result = PaymentRecorder::record(&mut tx, actor, draft).await;
        settle(tx, "record_payment", result).await
    }

    #[instrument(skip(self, draft), fields(order_id = %draft.order_id), err)]
    pub async fn record_shipment(
        &self,
        actor: &Actor,
        draft: NewShipment,
    ) -> WorkflowResult<RecordedShipment> {
        let mut tx = self.store.begin().await?;
        let result = ShipmentRecorder::record(&mut tx, actor, draft).await;
        settle(tx, "record_shipment", result).await
    }

    /// Administrative override to delivered, cancelled or returned.
    #[instrument(skip(self), err)]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> WorkflowResult<Order> {
        let mut tx = self.store.begin().await?;
        let result = OrderBook::set_status(&mut tx, order_id, status).await;
        settle(tx, "update_order_status", result).await
    }

    #[instrument(skip(self, update), fields(product_id = %update.product_id, quantity = update.quantity), err)]
    pub async fn update_order_line(
        &self,
        order_id: OrderId,
        update: LineUpdate,
    ) -> WorkflowResult<OrderRecord> {
        let mut tx = self.store.begin().await?;
        let result = OrderBook::update_line(
            &mut tx,
            order_id,
            update.product_id,
            update.quantity,
            update.unit_price,
        )
        .await;
        settle(tx, "update_order_line", result).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete_order(&self, order_id: OrderId) -> WorkflowResult<OrderRemoval> {
        let mut tx = self.store.begin().await?;
        let result = OrderBook::delete(&mut tx, order_id).await;
        settle(tx, "delete_order", result).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete_payment(&self, payment_id: PaymentId) -> WorkflowResult<Payment> {
        let mut tx = self.store.begin().await?;
        let result = PaymentRecorder::delete(&mut tx, payment_id).await;
        settle(tx, "delete_payment", result).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete_shipment(&self, shipment_id: ShipmentId) -> WorkflowResult<Shipment> {
        let mut tx = self.store.begin().await?;
        let result = ShipmentRecorder::delete(&mut tx, shipment_id).await;
        settle(tx, "delete_shipment", result).await
    }

    /// Administrative rewrite of a payment row.
    #[instrument(skip(self, draft), fields(order_id = %draft.order_id), err)]
    pub async fn update_payment(
        &self,
        payment_id: PaymentId,
        draft: NewPayment,
    ) -> WorkflowResult<RecordedPayment> {
        let mut tx = self.store.begin().await?;
        let result = PaymentRecorder::update(&mut tx, payment_id, draft).await;
        settle(tx, "update_payment", result).await
    }

    /// Administrative rewrite of a shipment row.
    #[instrument(skip(self, draft), fields(order_id = %draft.order_id), err)]
    pub async fn update_shipment(
        &self,
        shipment_id: ShipmentId,
        draft: NewShipment,
    ) -> WorkflowResult<RecordedShipment> {
        let mut tx = self.store.begin().await?;
        let result = ShipmentRecorder::update(&mut tx, shipment_id, draft).await;
        settle(tx, "update_shipment", result).await
    }

    #[instrument(skip(self), err)]
    pub async fn update_shipment_status(
        &self,
        shipment_id: ShipmentId,
        status: ShipmentStatus,
    ) -> WorkflowResult<RecordedShipment> {
        let mut tx = self.store.begin().await?;
        let result = ShipmentRecorder::update_status(&mut tx, shipment_id, status).await;
        settle(tx, "update_shipment_status", result).await
    }

    /// Read an order and its line in a short transaction.
    pub async fn order(&self, order_id: OrderId) -> WorkflowResult<OrderRecord> {
        let mut tx = self.store.begin().await?;
        let result = OrderBook::load(&mut tx, order_id).await;
        settle(tx, "load_order", result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;
    use crate::store::{FaultPoint, InMemoryStore, StoreError};
    use chrono::Utc;
    use orderdesk_parties::NewCustomer;
    use orderdesk_products::{NewProduct, ProductCategory};
    use orderdesk_sales::{Carrier, PaymentMethod, PaymentStatus};

    struct Fixture {
        workflow: OrderWorkflow<InMemoryStore>,
        customer: CustomerId,
        product: ProductId,
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    async fn fixture(stock: u32) -> Fixture {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let customer = tx
            .insert_customer(
                NewCustomer {
                    name: "Grace".to_string(),
                    email: "grace@example.com".to_string(),
                    phone: String::new(),
                    address: String::new(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let product = tx
            .insert_product(NewProduct {
                name: "Compiler".to_string(),
                description: String::new(),
                unit_price: Money::from_minor(1000),
                stock,
                category: ProductCategory::Books,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        Fixture {
            workflow: OrderWorkflow::new(store),
            customer: customer.id,
            product: product.id,
        }
    }

    fn order_request(f: &Fixture, quantity: u32) -> NewOrder {
        NewOrder {
            customer_id: f.customer,
            product_id: f.product,
            quantity,
            order_date: date(),
        }
    }

    fn payment(order_id: OrderId, status: PaymentStatus) -> NewPayment {
        NewPayment {
            order_id,
            amount: Money::from_minor(3000),
            method: PaymentMethod::CreditCard,
            payment_date: date(),
            status,
        }
    }

    fn shipment(order_id: OrderId) -> NewShipment {
        NewShipment {
            order_id,
            carrier: Carrier::Ups,
            tracking_number: "1Z999AA10123456784".to_string(),
            ship_date: date(),
            status: ShipmentStatus::InTransit,
        }
    }

    async fn stock(f: &Fixture) -> u32 {
        let mut tx = f.workflow.store().begin().await.unwrap();
        tx.product(f.product).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn failed_line_insert_rolls_back_stock_and_order() {
        let f = fixture(5).await;
        f.workflow.store().fail_at(FaultPoint::InsertLine);

        let err = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 3))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(stock(&f).await, 5);

        let store = f.workflow.store();
        assert!(store.tables().await.orders.is_empty());
    }

    #[tokio::test]
    async fn failed_commit_leaves_nothing_behind() {
        let f = fixture(5).await;
        f.workflow.store().fail_at(FaultPoint::Commit);

        assert!(
            f.workflow
                .create_order(&Actor::Admin, order_request(&f, 3))
                .await
                .is_err()
        );
        assert_eq!(stock(&f).await, 5);
        assert!(f.workflow.store().tables().await.lines.is_empty());
    }

    #[tokio::test]
    async fn customer_cannot_order_for_someone_else() {
        let f = fixture(5).await;
        let actor = Actor::Customer(CustomerId::new(f.customer.get() + 1));
        let err = f
            .workflow
            .create_order(&actor, order_request(&f, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PreconditionFailed(_)));
        assert_eq!(stock(&f).await, 5);
    }

    #[tokio::test]
    async fn failed_status_write_keeps_payment_out() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 1))
            .await
            .unwrap();

        f.workflow.store().fail_at(FaultPoint::SetOrderStatus);
        assert!(
            f.workflow
                .record_payment(&Actor::Admin, payment(placed.order.id, PaymentStatus::Completed))
                .await
                .is_err()
        );

        let tables = f.workflow.store().tables().await;
        assert!(tables.payments.is_empty());
        assert_eq!(tables.orders[&placed.order.id].status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn pending_payment_does_not_advance() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 1))
            .await
            .unwrap();
        let recorded = f
            .workflow
            .record_payment(&Actor::Admin, payment(placed.order.id, PaymentStatus::Pending))
            .await
            .unwrap();
        assert_eq!(recorded.order_status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn admin_may_ship_a_pending_order() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 1))
            .await
            .unwrap();
        let recorded = f
            .workflow
            .record_shipment(&Actor::Admin, shipment(placed.order.id))
            .await
            .unwrap();
        assert_eq!(recorded.order_status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn cancelled_order_refuses_payment_and_shipment() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 2))
            .await
            .unwrap();
        f.workflow
            .update_order_status(placed.order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(stock(&f).await, 5);

        let err = f
            .workflow
            .record_payment(&Actor::Admin, payment(placed.order.id, PaymentStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PreconditionFailed(_)));

        let err = f
            .workflow
            .record_shipment(&Actor::Admin, shipment(placed.order.id))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn payment_on_shipped_order_keeps_status() {
        let f = fixture(5).await;
        let actor = Actor::Customer(f.customer);
        let placed = f
            .workflow
            .create_order(&actor, order_request(&f, 1))
            .await
            .unwrap();
        f.workflow
            .record_payment(&actor, payment(placed.order.id, PaymentStatus::Completed))
            .await
            .unwrap();
        f.workflow
            .record_shipment(&actor, shipment(placed.order.id))
            .await
            .unwrap();

        let recorded = f
            .workflow
            .record_payment(&Actor::Admin, payment(placed.order.id, PaymentStatus::Completed))
            .await
            .unwrap();
        assert_eq!(recorded.order_status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn shipment_delivery_completes_the_order() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 1))
            .await
            .unwrap();
        let shipped = f
            .workflow
            .record_shipment(&Actor::Admin, shipment(placed.order.id))
            .await
            .unwrap();

        let delivered = f
            .workflow
            .update_shipment_status(shipped.shipment.id, ShipmentStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered.shipment.status, ShipmentStatus::Delivered);
        assert_eq!(delivered.order_status, OrderStatus::Delivered);

        let returned = f
            .workflow
            .update_shipment_status(shipped.shipment.id, ShipmentStatus::Returned)
            .await
            .unwrap();
        assert_eq!(returned.order_status, OrderStatus::Returned);
        assert_eq!(stock(&f).await, 4);
    }

    #[tokio::test]
    async fn delete_order_cascades_dependents() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 2))
            .await
            .unwrap();
        f.workflow
            .record_payment(&Actor::Admin, payment(placed.order.id, PaymentStatus::Completed))
            .await
            .unwrap();
        f.workflow
            .record_shipment(&Actor::Admin, shipment(placed.order.id))
            .await
            .unwrap();

        let removal = f.workflow.delete_order(placed.order.id).await.unwrap();
        assert_eq!(removal.released, None);
        assert_eq!(stock(&f).await, 3);

        let tables = f.workflow.store().tables().await;
        assert!(tables.orders.is_empty());
        assert!(tables.payments.is_empty());
        assert!(tables.shipments.is_empty());
    }

    #[tokio::test]
    async fn deleting_missing_rows_is_not_found() {
        let f = fixture(5).await;
        assert!(matches!(
            f.workflow.delete_order(OrderId::new(77)).await,
            Err(WorkflowError::NotFound {
                entity: EntityKind::Order,
                id: 77
            })
        ));
        assert!(matches!(
            f.workflow.delete_payment(PaymentId::new(77)).await,
            Err(WorkflowError::NotFound {
                entity: EntityKind::Payment,
                ..
            })
        ));
        assert!(matches!(
            f.workflow.delete_shipment(ShipmentId::new(77)).await,
            Err(WorkflowError::NotFound {
                entity: EntityKind::Shipment,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn line_update_through_workflow() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 2))
            .await
            .unwrap();

        let err = f
            .workflow
            .update_order_line(
                placed.order.id,
                LineUpdate {
                    product_id: f.product,
                    quantity: 9,
                    unit_price: Money::from_minor(1000),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InsufficientStock {
                requested: 9,
                available: 5,
                ..
            }
        ));
        assert_eq!(stock(&f).await, 3);

        let updated = f
            .workflow
            .update_order_line(
                placed.order.id,
                LineUpdate {
                    product_id: f.product,
                    quantity: 4,
                    unit_price: Money::from_minor(900),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total(), Money::from_minor(3600));
        assert_eq!(stock(&f).await, 1);
    }

    #[tokio::test]
    async fn refused_delivery_leaves_the_shipment_unchanged() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 1))
            .await
            .unwrap();
        let shipped = f
            .workflow
            .record_shipment(&Actor::Admin, shipment(placed.order.id))
            .await
            .unwrap();
        f.workflow
            .update_order_status(placed.order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        let err = f
            .workflow
            .update_shipment_status(shipped.shipment.id, ShipmentStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PreconditionFailed(_)));

        let tables = f.workflow.store().tables().await;
        assert_eq!(
            tables.shipments[&shipped.shipment.id].status,
            ShipmentStatus::InTransit
        );
        assert_eq!(tables.orders[&placed.order.id].status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn completing_a_pending_payment_advances_the_order() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 1))
            .await
            .unwrap();
        let recorded = f
            .workflow
            .record_payment(&Actor::Admin, payment(placed.order.id, PaymentStatus::Pending))
            .await
            .unwrap();

        let mut draft = payment(placed.order.id, PaymentStatus::Completed);
        draft.method = PaymentMethod::BankTransfer;
        let updated = f
            .workflow
            .update_payment(recorded.payment.id, draft)
            .await
            .unwrap();
        assert_eq!(updated.order_status, OrderStatus::Processing);
        assert_eq!(updated.payment.method, PaymentMethod::BankTransfer);

        let tables = f.workflow.store().tables().await;
        assert_eq!(tables.payments[&recorded.payment.id], updated.payment);
        assert_eq!(tables.orders[&placed.order.id].status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn payment_updates_keep_their_order() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 1))
            .await
            .unwrap();
        let recorded = f
            .workflow
            .record_payment(&Actor::Admin, payment(placed.order.id, PaymentStatus::Pending))
            .await
            .unwrap();

        let moved = payment(OrderId::new(placed.order.id.get() + 100), PaymentStatus::Completed);
        assert!(matches!(
            f.workflow.update_payment(recorded.payment.id, moved).await,
            Err(WorkflowError::PreconditionFailed(_))
        ));
        assert!(matches!(
            f.workflow
                .update_payment(PaymentId::new(77), payment(placed.order.id, PaymentStatus::Completed))
                .await,
            Err(WorkflowError::NotFound {
                entity: EntityKind::Payment,
                id: 77
            })
        ));
        assert_eq!(
            f.workflow.order(placed.order.id).await.unwrap().order.status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn completing_a_payment_on_a_cancelled_order_is_refused() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 1))
            .await
            .unwrap();
        let recorded = f
            .workflow
            .record_payment(&Actor::Admin, payment(placed.order.id, PaymentStatus::Pending))
            .await
            .unwrap();
        f.workflow
            .update_order_status(placed.order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        let err = f
            .workflow
            .update_payment(recorded.payment.id, payment(placed.order.id, PaymentStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PreconditionFailed(_)));
        assert_eq!(
            f.workflow.store().tables().await.payments[&recorded.payment.id].status,
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn shipment_update_rewrites_every_field() {
        let f = fixture(5).await;
        let placed = f
            .workflow
            .create_order(&Actor::Admin, order_request(&f, 1))
            .await
            .unwrap();
        let recorded = f
            .workflow
            .record_shipment(&Actor::Admin, shipment(placed.order.id))
            .await
            .unwrap();

        let draft = NewShipment {
            order_id: placed.order.id,
            carrier: Carrier::Dhl,
            tracking_number: "  JD014600006281  ".to_string(),
            ship_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            status: ShipmentStatus::Delivered,
        };
        let updated = f
            .workflow
            .update_shipment(recorded.shipment.id, draft)
            .await
            .unwrap();
        assert_eq!(updated.shipment.carrier, Carrier::Dhl);
        assert_eq!(updated.shipment.tracking_number, "JD014600006281");
        assert_eq!(updated.order_status, OrderStatus::Delivered);
        assert_eq!(
            f.workflow.store().tables().await.shipments[&recorded.shipment.id],
            updated.shipment
        );

        let mut blank = shipment(placed.order.id);
        blank.tracking_number = "   ".to_string();
        assert!(matches!(
            f.workflow.update_shipment(recorded.shipment.id, blank).await,
            Err(WorkflowError::Validation(_))
        ));
    }

    #[derive(Debug, Clone, Copy)]
    enum Transition {
        Create,
        Pay,
        Ship,
        Cancel,
        EditLine,
        DeletePendingOrder,
        DeleteShippedOrder,
        DeletePayment,
        DeleteShipment,
        CompletePayment,
        DeliverShipment,
    }

    struct Seeded {
        order: OrderId,
        payment: Option<PaymentId>,
        shipment: Option<ShipmentId>,
    }

    /// Bring a fresh fixture to the state `transition` starts from.
    async fn seed(f: &Fixture, transition: Transition) -> Seeded {
        let w = &f.workflow;
        let order = w
            .create_order(&Actor::Admin, order_request(f, 2))
            .await
            .unwrap()
            .order
            .id;
        let mut seeded = Seeded {
            order,
            payment: None,
            shipment: None,
        };
        match transition {
            Transition::Ship => {
                w.record_payment(&Actor::Admin, payment(order, PaymentStatus::Completed))
                    .await
                    .unwrap();
            }
            Transition::DeletePendingOrder | Transition::DeletePayment | Transition::CompletePayment => {
                let recorded = w
                    .record_payment(&Actor::Admin, payment(order, PaymentStatus::Pending))
                    .await
                    .unwrap();
                seeded.payment = Some(recorded.payment.id);
            }
            Transition::DeleteShippedOrder | Transition::DeleteShipment | Transition::DeliverShipment => {
                let recorded = w.record_shipment(&Actor::Admin, shipment(order)).await.unwrap();
                seeded.shipment = Some(recorded.shipment.id);
            }
            Transition::Create | Transition::Pay | Transition::Cancel | Transition::EditLine => {}
        }
        seeded
    }

    async fn run(f: &Fixture, seeded: &Seeded, transition: Transition) -> WorkflowResult<()> {
        let w = &f.workflow;
        let order = seeded.order;
        match transition {
            Transition::Create => w.create_order(&Actor::Admin, order_request(f, 1)).await.map(drop),
            Transition::Pay => w
                .record_payment(&Actor::Admin, payment(order, PaymentStatus::Completed))
                .await
                .map(drop),
            Transition::Ship => w.record_shipment(&Actor::Admin, shipment(order)).await.map(drop),
            Transition::Cancel => w
                .update_order_status(order, OrderStatus::Cancelled)
                .await
                .map(drop),
            Transition::EditLine => w
                .update_order_line(
                    order,
                    LineUpdate {
                        product_id: f.product,
                        quantity: 3,
                        unit_price: Money::from_minor(900),
                    },
                )
                .await
                .map(drop),
            Transition::DeletePendingOrder | Transition::DeleteShippedOrder => {
                w.delete_order(order).await.map(drop)
            }
            Transition::DeletePayment => w.delete_payment(seeded.payment.unwrap()).await.map(drop),
            Transition::DeleteShipment => w.delete_shipment(seeded.shipment.unwrap()).await.map(drop),
            Transition::CompletePayment => w
                .update_payment(
                    seeded.payment.unwrap(),
                    payment(order, PaymentStatus::Completed),
                )
                .await
                .map(drop),
            Transition::DeliverShipment => {
                let mut draft = shipment(order);
                draft.carrier = Carrier::Fedex;
                draft.status = ShipmentStatus::Delivered;
                w.update_shipment(seeded.shipment.unwrap(), draft).await.map(drop)
            }
        }
    }

    #[tokio::test]
    async fn every_fault_point_rolls_back_the_whole_transition() {
        use FaultPoint as P;
        use Transition as T;

        let cases = [
            (T::Create, P::DecrementStock),
            (T::Create, P::InsertOrder),
            (T::Create, P::InsertLine),
            (T::Create, P::Commit),
            (T::Pay, P::InsertPayment),
            (T::Pay, P::SetOrderStatus),
            (T::Pay, P::Commit),
            (T::Ship, P::InsertShipment),
            (T::Ship, P::SetOrderStatus),
            (T::Cancel, P::IncrementStock),
            (T::Cancel, P::SetOrderStatus),
            (T::EditLine, P::IncrementStock),
            (T::EditLine, P::DecrementStock),
            (T::EditLine, P::UpdateLine),
            (T::DeletePendingOrder, P::DeletePayment),
            (T::DeletePendingOrder, P::IncrementStock),
            (T::DeletePendingOrder, P::DeleteLine),
            (T::DeletePendingOrder, P::DeleteOrder),
            (T::DeleteShippedOrder, P::DeleteShipment),
            (T::DeleteShippedOrder, P::DeleteOrder),
            (T::DeletePayment, P::DeletePayment),
            (T::DeleteShipment, P::DeleteShipment),
            (T::CompletePayment, P::UpdatePayment),
            (T::CompletePayment, P::SetOrderStatus),
            (T::DeliverShipment, P::UpdateShipment),
            (T::DeliverShipment, P::SetOrderStatus),
            (T::DeliverShipment, P::Commit),
        ];

        for (transition, point) in cases {
            let f = fixture(5).await;
            let seeded = seed(&f, transition).await;
            let before = f.workflow.store().tables().await.clone();

            f.workflow.store().fail_at(point);
            let err = run(&f, &seeded, transition).await.unwrap_err();
            assert!(
                matches!(err, WorkflowError::StoreFailure(StoreError::Injected(p)) if p == point),
                "{transition:?} at {point:?}: {err}"
            );
            assert!(
                *f.workflow.store().tables().await == before,
                "{transition:?} at {point:?} left partial writes"
            );

            // The fault fired and disarmed, so the same transition now goes through.
            run(&f, &seeded, transition)
                .await
                .unwrap_or_else(|e| panic!("{transition:?} retry after {point:?}: {e}"));
        }
    }
}
