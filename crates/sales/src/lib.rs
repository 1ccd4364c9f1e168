//! Sales domain module: orders, payments, shipments.
//!
//! This crate contains the order lifecycle rules (status state machine,
//! ownership and readiness checks), implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage). `orderdesk-infra` applies them inside
//! store transactions.

pub mod order;
pub mod payment;
pub mod shipment;

pub use order::{Order, OrderLine, OrderStatus};
pub use payment::{NewPayment, Payment, PaymentMethod, PaymentStatus};
pub use shipment::{Carrier, NewShipment, Shipment, ShipmentStatus};
