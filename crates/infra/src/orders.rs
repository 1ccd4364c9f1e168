//! Order Aggregate data access: order header plus its single line.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument};

use orderdesk_core::{Actor, CustomerId, Money, OrderId, ProductId};
use orderdesk_sales::{Order, OrderLine, OrderStatus};

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::ledger::InventoryLedger;
use crate::store::StoreTransaction;

/// An order header together with its line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub order: Order,
    pub line: OrderLine,
}

impl OrderRecord {
    pub fn total(&self) -> Money {
        self.line.line_total()
    }
}

/// What deleting an order did to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRemoval {
    pub order_id: OrderId,
    /// Units credited back, if the order still held its reservation.
    pub released: Option<u32>,
}

pub struct OrderBook;

impl OrderBook {
    /// Reserve stock, then insert the order (`pending`) and its line with the
    /// product's current price as the snapshot.
    #[instrument(skip(tx), err)]
    pub async fn create<T>(
        tx: &mut T,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
        order_date: NaiveDate,
    ) -> WorkflowResult<OrderRecord>
    where
        T: StoreTransaction + ?Sized,
    {
        if tx.customer(customer_id).await?.is_none() {
            return Err(WorkflowError::not_found(EntityKind::Customer, customer_id));
        }

        let reservation = InventoryLedger::reserve(tx, product_id, quantity).await?;
        let order = tx
            .insert_order(customer_id, order_date, OrderStatus::Pending)
            .await?;
        let line = OrderLine::new(
            order.id,
            product_id,
            quantity,
            reservation.product.unit_price,
        )?;
        tx.insert_line(&line).await?;

        debug!(order_id = %order.id, remaining = reservation.remaining, "order created");
        Ok(OrderRecord { order, line })
    }

    pub async fn load<T>(tx: &mut T, order_id: OrderId) -> WorkflowResult<OrderRecord>
    where
        T: StoreTransaction + ?Sized,
    {
        let order = Self::header(tx, order_id).await?;
        let line = tx
            .line(order_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::OrderLine, order_id))?;
        Ok(OrderRecord { order, line })
    }

    /// Locking read of the header alone.
    pub async fn header<T>(tx: &mut T, order_id: OrderId) -> WorkflowResult<Order>
    where
        T: StoreTransaction + ?Sized,
    {
        tx.order(order_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Order, order_id))
    }

    /// Header read on behalf of `actor`; customers only reach their own orders.
    pub async fn header_for<T>(tx: &mut T, actor: &Actor, order_id: OrderId) -> WorkflowResult<Order>
    where
        T: StoreTransaction + ?Sized,
    {
        let order = Self::header(tx, order_id).await?;
        match actor.customer_id() {
            Some(customer_id) if !order.is_visible_to(actor) => {
                Err(WorkflowError::OwnershipViolation {
                    order_id,
                    customer_id,
                })
            }
            _ => Ok(order),
        }
    }

    /// Replace the line of a pending order.
    ///
    /// The old quantity goes back to the old product before the new quantity
    /// is reserved, so changing only the quantity of the same product works
    /// against the combined level. `unit_price` becomes the new snapshot.
    #[instrument(skip(tx), err)]
    pub async fn update_line<T>(
        tx: &mut T,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> WorkflowResult<OrderRecord>
    where
        T: StoreTransaction + ?Sized,
    {
        let current = Self::load(tx, order_id).await?;
        current.order.check_line_editable()?;
        let line = OrderLine::new(order_id, product_id, quantity, unit_price)?;

        InventoryLedger::release(tx, current.line.product_id, current.line.quantity).await?;
        InventoryLedger::reserve(tx, product_id, quantity).await?;

        if !tx.update_line(&line).await? {
            return Err(WorkflowError::not_found(EntityKind::OrderLine, order_id));
        }
        Ok(OrderRecord {
            order: current.order,
            line,
        })
    }

    /// Administrative status override.
    ///
    /// Cancelling or returning an order that has not shipped credits its
    /// quantity back to stock.
    #[instrument(skip(tx), err)]
    pub async fn set_status<T>(
        tx: &mut T,
        order_id: OrderId,
        status: OrderStatus,
    ) -> WorkflowResult<Order>
    where
        T: StoreTransaction + ?Sized,
    {
        let mut order = Self::header(tx, order_id).await?;
        order.status.check_override(status)?;
        if order.status == status {
            return Ok(order);
        }

        if order.status.releases_reservation(status) {
            let line = tx
                .line(order_id)
                .await?
                .ok_or_else(|| WorkflowError::not_found(EntityKind::OrderLine, order_id))?;
            InventoryLedger::release(tx, line.product_id, line.quantity).await?;
        }

        tx.set_order_status(order_id, status).await?;
        debug!(from = %order.status, to = %status, "order status overridden");
        order.status = status;
        Ok(order)
    }

    /// Set a forward status reached by a payment or shipment.
    pub(crate) async fn advance<T>(
        tx: &mut T,
        order: &mut Order,
        next: OrderStatus,
    ) -> WorkflowResult<()>
    where
        T: StoreTransaction + ?Sized,
    {
        if next != order.status {
            tx.set_order_status(order.id, next).await?;
            debug!(order_id = %order.id, from = %order.status, to = %next, "order advanced");
            order.status = next;
        }
        Ok(())
    }

    /// Delete an order with everything that references it.
    ///
    /// Rows go in dependency order: shipments, payments, the line, then the
    /// header. Stock still reserved by the order is credited back.
    #[instrument(skip(tx), err)]
    pub async fn delete<T>(tx: &mut T, order_id: OrderId) -> WorkflowResult<OrderRemoval>
    where
        T: StoreTransaction + ?Sized,
    {
        let order = Self::header(tx, order_id).await?;

        for shipment in tx.shipments_for_order(order_id).await? {
            tx.delete_shipment(shipment.id).await?;
        }
        for payment in tx.payments_for_order(order_id).await? {
            tx.delete_payment(payment.id).await?;
        }

        let mut released = None;
        if let Some(line) = tx.line(order_id).await? {
            if order.status.holds_reservation() {
                InventoryLedger::release(tx, line.product_id, line.quantity).await?;
                released = Some(line.quantity);
            }
            tx.delete_line(order_id).await?;
        }

        tx.delete_order(order_id).await?;
        Ok(OrderRemoval { order_id, released })
    }
}
