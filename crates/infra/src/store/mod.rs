//! Transactional store boundary.
//!
//! Core operations never perform IO directly: they receive a transaction from
//! a [`Store`] and issue row-level reads and writes through
//! [`StoreTransaction`]. Two backends are provided, an in-memory one for
//! tests/dev and a Postgres one.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{FaultPoint, InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use r#trait::{Store, StoreError, StoreTransaction};
