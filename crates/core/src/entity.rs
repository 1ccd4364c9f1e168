//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Every record the store assigns an identifier to (product, customer, order,
/// payment, shipment) implements this.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
