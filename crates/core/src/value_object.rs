//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one. `Money` and `StockLevel` are the value objects of this
/// domain; an order line's unit price is a `Money` copied out of the product
/// at order time, which is what makes it a snapshot rather than a reference.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
