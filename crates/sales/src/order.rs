use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderdesk_core::{Actor, CustomerId, DomainError, DomainResult, Entity, Money, OrderId, ProductId};

use crate::payment::PaymentStatus;

/// Order status lifecycle.
///
/// ```text
/// pending ──pay──▶ processing ──ship──▶ shipped ──▶ delivered
///    │                 │                   │            │
///    └─────────────────┴───── override ────┴──▶ cancelled / returned
/// ```
///
/// Forward progress (`processing`, `shipped`) only happens through a recorded
/// payment or shipment. `delivered`, `cancelled` and `returned` are reached by
/// administrative override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Returned
        )
    }

    /// True while the order's quantity is still deducted from stock and has
    /// not left the warehouse. Ending the order in this state must credit
    /// the quantity back.
    pub fn holds_reservation(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Whether moving to `target` ends the order before it ships, so the
    /// reserved quantity goes back to stock.
    pub fn releases_reservation(self, target: OrderStatus) -> bool {
        self.holds_reservation() && matches!(target, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    /// Whether new payments or shipments may reference an order in this status.
    pub fn is_open(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    /// Statuses an administrator may set directly.
    pub fn is_override_target(&self) -> bool {
        self.is_terminal()
    }

    /// Check an administrative `set status` request.
    ///
    /// Setting the current status again is accepted (no-op). Otherwise the
    /// target must be an override target and the source non-terminal, with
    /// the single exception of `delivered → returned`.
    pub fn check_override(self, target: OrderStatus) -> DomainResult<()> {
        if self == target {
            return Ok(());
        }
        if !target.is_override_target() {
            return Err(DomainError::invariant(format!(
                "status '{target}' is only reached by recording a payment or shipment"
            )));
        }
        match (self, target) {
            (from, _) if !from.is_terminal() => Ok(()),
            (OrderStatus::Delivered, OrderStatus::Returned) => Ok(()),
            (from, to) => Err(DomainError::invariant(format!(
                "order is already '{from}'; cannot move to '{to}'"
            ))),
        }
    }

    /// Status after a payment with `payment` status is recorded. Never regresses.
    pub fn after_payment(self, payment: PaymentStatus) -> OrderStatus {
        match (self, payment) {
            (OrderStatus::Pending, PaymentStatus::Completed) => OrderStatus::Processing,
            (current, _) => current,
        }
    }

    /// Status after a shipment is recorded. Never regresses.
    pub fn after_shipment(self) -> OrderStatus {
        match self {
            OrderStatus::Pending | OrderStatus::Processing => OrderStatus::Shipped,
            current => current,
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown order status '{s}'")))
    }
}

/// Order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
}

impl Order {
    pub fn is_owned_by(&self, customer_id: CustomerId) -> bool {
        self.customer_id == customer_id
    }

    /// Whether `actor` may act on this order at all.
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        match actor {
            Actor::Admin => true,
            Actor::Customer(id) => self.is_owned_by(*id),
        }
    }

    pub fn check_accepts_payment(&self) -> DomainResult<()> {
        if !self.status.is_open() {
            return Err(DomainError::invariant(format!(
                "order {} is '{}' and cannot take payments",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Readiness check for recording a shipment.
    ///
    /// Customers may only ship an order that has been paid (`processing`).
    /// Administrators may ship any order that is still open.
    pub fn check_ready_for_shipment(&self, actor: &Actor) -> DomainResult<()> {
        match actor {
            Actor::Customer(_) if self.status != OrderStatus::Processing => {
                Err(DomainError::invariant(format!(
                    "order {} is '{}'; only paid (processing) orders can be shipped",
                    self.id, self.status
                )))
            }
            _ if !self.status.is_open() => Err(DomainError::invariant(format!(
                "order {} is '{}' and cannot be shipped",
                self.id, self.status
            ))),
            _ => Ok(()),
        }
    }

    /// Line edits are only allowed before payment.
    pub fn check_line_editable(&self) -> DomainResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::invariant(format!(
                "order {} is '{}'; only pending orders can change their line",
                self.id, self.status
            )));
        }
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// The single product line of an order.
///
/// `unit_price` is the product's price at the moment the line was written; a
/// later catalog price change does not touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn new(
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if unit_price.is_negative() {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        if unit_price.checked_mul(quantity).is_none() {
            return Err(DomainError::validation(format!(
                "line total overflows ({unit_price} x {quantity})"
            )));
        }
        Ok(Self {
            order_id,
            product_id,
            quantity,
            unit_price,
        })
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.saturating_mul(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(7),
            customer_id: CustomerId::new(5),
            order_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status,
        }
    }

    #[test]
    fn completed_payment_moves_pending_to_processing() {
        assert_eq!(
            OrderStatus::Pending.after_payment(PaymentStatus::Completed),
            OrderStatus::Processing
        );
    }

    #[test]
    fn non_completed_payment_leaves_status() {
        for p in [PaymentStatus::Pending, PaymentStatus::Failed, PaymentStatus::Refunded] {
            assert_eq!(OrderStatus::Pending.after_payment(p), OrderStatus::Pending);
        }
    }

    #[test]
    fn payment_never_regresses_status() {
        for s in [OrderStatus::Shipped, OrderStatus::Delivered] {
            assert_eq!(s.after_payment(PaymentStatus::Completed), s);
        }
    }

    #[test]
    fn shipment_moves_open_orders_to_shipped() {
        assert_eq!(OrderStatus::Processing.after_shipment(), OrderStatus::Shipped);
        assert_eq!(OrderStatus::Pending.after_shipment(), OrderStatus::Shipped);
        assert_eq!(OrderStatus::Delivered.after_shipment(), OrderStatus::Delivered);
    }

    #[test]
    fn overrides_reach_terminal_states_from_open_states() {
        for from in [OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Shipped] {
            for to in [OrderStatus::Delivered, OrderStatus::Cancelled, OrderStatus::Returned] {
                assert!(from.check_override(to).is_ok(), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn overrides_cannot_set_forward_statuses() {
        let err = OrderStatus::Pending
            .check_override(OrderStatus::Processing)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(OrderStatus::Pending.check_override(OrderStatus::Shipped).is_err());
    }

    #[test]
    fn terminal_states_are_final_except_delivered_to_returned() {
        assert!(OrderStatus::Delivered.check_override(OrderStatus::Returned).is_ok());
        assert!(OrderStatus::Cancelled.check_override(OrderStatus::Delivered).is_err());
        assert!(OrderStatus::Returned.check_override(OrderStatus::Cancelled).is_err());
        assert!(OrderStatus::Delivered.check_override(OrderStatus::Cancelled).is_err());
    }

    #[test]
    fn same_status_override_is_a_no_op() {
        assert!(OrderStatus::Cancelled.check_override(OrderStatus::Cancelled).is_ok());
        assert!(OrderStatus::Pending.check_override(OrderStatus::Pending).is_ok());
    }

    #[test]
    fn reservation_is_held_until_shipment() {
        assert!(OrderStatus::Pending.holds_reservation());
        assert!(OrderStatus::Processing.holds_reservation());
        assert!(!OrderStatus::Shipped.holds_reservation());
        assert!(!OrderStatus::Cancelled.holds_reservation());
    }

    #[test]
    fn only_unshipped_endings_release_stock() {
        assert!(OrderStatus::Pending.releases_reservation(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.releases_reservation(OrderStatus::Returned));
        assert!(!OrderStatus::Processing.releases_reservation(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.releases_reservation(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.releases_reservation(OrderStatus::Returned));
    }

    #[test]
    fn customer_shipment_requires_processing() {
        let actor = Actor::Customer(CustomerId::new(5));
        assert!(order(OrderStatus::Pending).check_ready_for_shipment(&actor).is_err());
        assert!(order(OrderStatus::Processing).check_ready_for_shipment(&actor).is_ok());
    }

    #[test]
    fn admin_shipment_allows_any_open_order() {
        assert!(order(OrderStatus::Pending).check_ready_for_shipment(&Actor::Admin).is_ok());
        assert!(order(OrderStatus::Cancelled).check_ready_for_shipment(&Actor::Admin).is_err());
    }

    #[test]
    fn cancelled_orders_refuse_payment() {
        assert!(order(OrderStatus::Cancelled).check_accepts_payment().is_err());
        assert!(order(OrderStatus::Shipped).check_accepts_payment().is_ok());
    }

    #[test]
    fn visibility_follows_ownership() {
        let o = order(OrderStatus::Pending);
        assert!(o.is_visible_to(&Actor::Admin));
        assert!(o.is_visible_to(&Actor::Customer(CustomerId::new(5))));
        assert!(!o.is_visible_to(&Actor::Customer(CustomerId::new(3))));
    }

    #[test]
    fn line_validation() {
        let price: Money = "10.00".parse().unwrap();
        let line = OrderLine::new(OrderId::new(1), ProductId::new(1), 2, price).unwrap();
        assert_eq!(line.line_total().to_string(), "20.00");

        assert!(OrderLine::new(OrderId::new(1), ProductId::new(1), 0, price).is_err());
        assert!(
            OrderLine::new(OrderId::new(1), ProductId::new(1), 2, Money::from_minor(i64::MAX))
                .is_err()
        );
    }

    #[test]
    fn status_strings_are_closed() {
        assert_eq!("in_transit".parse::<OrderStatus>().ok(), None);
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
    }
}
