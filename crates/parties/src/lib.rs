//! Parties domain module.
//!
//! Customers are maintained by the surrounding CRUD layer; the order workflow
//! only reads them (existence, ownership).

pub mod customer;

pub use customer::{Customer, NewCustomer};
