//! Caller identity, resolved before a request reaches the domain.

use serde::{Deserialize, Serialize};

use crate::id::CustomerId;

/// Who is invoking a core operation.
///
/// Authentication and sessions live outside this system; by the time a call
/// arrives the presentation layer has already decided whether the caller is
/// staff or a specific customer. Customer callers get ownership and ordering
/// checks that the administrative path skips.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "customer_id", rename_all = "snake_case")]
pub enum Actor {
    Admin,
    Customer(CustomerId),
}

impl Actor {
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Actor::Admin => None,
            Actor::Customer(id) => Some(*id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin)
    }
}
