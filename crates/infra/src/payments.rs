//! Payment Recorder.

use serde::Serialize;
use tracing::instrument;

use orderdesk_core::{Actor, PaymentId};
use orderdesk_sales::{NewPayment, OrderStatus, Payment};

use crate::error::{EntityKind, WorkflowError, WorkflowResult};
use crate::orders::OrderBook;
use crate::store::StoreTransaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedPayment {
    pub payment: Payment,
    /// Order status after the payment was applied.
    pub order_status: OrderStatus,
}

pub struct PaymentRecorder;

impl PaymentRecorder {
    /// Insert a payment and advance its order.
    ///
    /// Customers may only pay their own orders. A completed payment moves a
    /// pending order to processing; any other combination leaves the status
    /// alone. Cancelled and returned orders take no payments.
    #[instrument(skip(tx, draft), fields(order_id = %draft.order_id, status = %draft.status), err)]
    pub async fn record<T>(
        tx: &mut T,
        actor: &Actor,
        draft: NewPayment,
    ) -> WorkflowResult<RecordedPayment>
    where
        T: StoreTransaction + ?Sized,
    {
        let draft = draft.validate()?;
        let mut order = OrderBook::header_for(tx, actor, draft.order_id).await?;
        order.check_accepts_payment()?;

        let payment = tx.insert_payment(draft).await?;
        let next = order.status.after_payment(payment.status);
        OrderBook::advance(tx, &mut order, next).await?;

        Ok(RecordedPayment {
            payment,
            order_status: order.status,
        })
    }

    /// Rewrite a payment's amount, method, date and status.
    ///
    /// The payment stays attached to its order. A payment that becomes
    /// completed needs an open order and advances it like a new completed
    /// payment would.
    #[instrument(skip(tx, draft), fields(status = %draft.status), err)]
    pub async fn update<T>(
        tx: &mut T,
        payment_id: PaymentId,
        draft: NewPayment,
    ) -> WorkflowResult<RecordedPayment>
    where
        T: StoreTransaction + ?Sized,
    {
        let draft = draft.validate()?;
        let current = tx
            .payment(payment_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Payment, payment_id))?;
        if draft.order_id != current.order_id {
            return Err(WorkflowError::PreconditionFailed(format!(
                "payment {payment_id} belongs to order {} and cannot move to order {}",
                current.order_id, draft.order_id
            )));
        }

        let mut order = OrderBook::header(tx, current.order_id).await?;
        if draft.status.is_effective() && !current.status.is_effective() {
            order.check_accepts_payment()?;
        }

        let payment = Payment::from_draft(payment_id, draft);
        tx.update_payment(&payment).await?;
        let next = order.status.after_payment(payment.status);
        OrderBook::advance(tx, &mut order, next).await?;

        Ok(RecordedPayment {
            payment,
            order_status: order.status,
        })
    }

    /// Administrative delete. The order keeps whatever status it reached.
    #[instrument(skip(tx), err)]
    pub async fn delete<T>(tx: &mut T, payment_id: PaymentId) -> WorkflowResult<Payment>
    where
        T: StoreTransaction + ?Sized,
    {
        let payment = tx
            .payment(payment_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Payment, payment_id))?;
        tx.delete_payment(payment_id).await?;
        Ok(payment)
    }
}
