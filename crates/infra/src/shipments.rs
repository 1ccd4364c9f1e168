//! Shipment Recorder.

use serde::Serialize;
use tracing::{debug, instrument};

use orderdesk_core::{Actor, ShipmentId};
use orderdesk_sales::{NewShipment, OrderStatus, Shipment, ShipmentStatus};

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::orders::OrderBook;
use crate::store::StoreTransaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedShipment {
    pub shipment: Shipment,
    /// Order status after the shipment was applied.
    pub order_status: OrderStatus,
}

pub struct ShipmentRecorder;

impl ShipmentRecorder {
    /// Insert a shipment and mark its order shipped.
    ///
    /// Customers may only ship their own paid (`processing`) orders.
    /// Administrators may also ship a pending order. Statuses past `shipped`
    /// are kept.
    #[instrument(skip(tx, draft), fields(order_id = %draft.order_id, carrier = %draft.carrier), err)]
    pub async fn record<T>(
        tx: &mut T,
        actor: &Actor,
        draft: NewShipment,
    ) -> WorkflowResult<RecordedShipment>
    where
        T: StoreTransaction + ?Sized,
    {
        let draft = draft.validate()?;
        let mut order = OrderBook::header_for(tx, actor, draft.order_id).await?;
        order.check_ready_for_shipment(actor)?;

        let shipment = tx.insert_shipment(draft).await?;
        let next = order.status.after_shipment();
        OrderBook::advance(tx, &mut order, next).await?;

        Ok(RecordedShipment {
            shipment,
            order_status: order.status,
        })
    }

    /// Rewrite a shipment's carrier, tracking number, date and status.
    ///
    /// The shipment stays attached to its order. `delivered` and `returned`
    /// are carried over to the order, and an order that cannot take that
    /// override refuses the whole update. `shipped` moves a pending or
    /// processing order forward.
    #[instrument(skip(tx, draft), fields(status = %draft.status), err)]
    pub async fn update<T>(
        tx: &mut T,
        shipment_id: ShipmentId,
        draft: NewShipment,
    ) -> WorkflowResult<RecordedShipment>
    where
        T: StoreTransaction + ?Sized,
    {
        let draft = draft.validate()?;
        let current = tx
            .shipment(shipment_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Shipment, shipment_id))?;
        if draft.order_id != current.order_id {
            return Err(WorkflowError::PreconditionFailed(format!(
                "shipment {shipment_id} belongs to order {} and cannot move to order {}",
                current.order_id, draft.order_id
            )));
        }

        let mut order = OrderBook::header(tx, current.order_id).await?;
        let effect = draft.status.order_status_effect();
        if let Some(target) = effect {
            order.status.check_override(target)?;
        }

        let shipment = Shipment::from_draft(shipment_id, draft);
        tx.update_shipment(&shipment).await?;

        match effect {
            Some(target) => order = OrderBook::set_status(tx, order.id, target).await?,
            None if shipment.status == ShipmentStatus::Shipped => {
                let next = order.status.after_shipment();
                OrderBook::advance(tx, &mut order, next).await?;
            }
            None => debug!(order_id = %order.id, status = %order.status, "order keeps its status"),
        }

        Ok(RecordedShipment {
            shipment,
            order_status: order.status,
        })
    }

    /// Change only a shipment's status.
    pub async fn update_status<T>(
        tx: &mut T,
        shipment_id: ShipmentId,
        status: ShipmentStatus,
    ) -> WorkflowResult<RecordedShipment>
    where
        T: StoreTransaction + ?Sized,
    {
        let current = tx
            .shipment(shipment_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Shipment, shipment_id))?;
        let draft = NewShipment {
            order_id: current.order_id,
            carrier: current.carrier,
            tracking_number: current.tracking_number,
            ship_date: current.ship_date,
            status,
        };
        Self::update(tx, shipment_id, draft).await
    }

    /// Administrative delete. The order keeps whatever status it reached.
    #[instrument(skip(tx), err)]
    pub async fn delete<T>(tx: &mut T, shipment_id: ShipmentId) -> WorkflowResult<Shipment>
    where
        T: StoreTransaction + ?Sized,
    {
        let shipment = tx
            .shipment(shipment_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Shipment, shipment_id))?;
        tx.delete_shipment(shipment_id).await?;
        Ok(shipment)
    }
}
