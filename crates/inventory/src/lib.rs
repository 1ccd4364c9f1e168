//! Inventory domain module.
//!
//! Stock arithmetic for the inventory ledger, implemented purely as
//! deterministic domain logic (no IO, no storage). The ledger that applies it
//! inside a store transaction lives in `orderdesk-infra`.

pub mod stock;

pub use stock::{InventoryError, StockLevel};
