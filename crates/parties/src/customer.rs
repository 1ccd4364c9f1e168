use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{CustomerId, DomainError, DomainResult, Entity};

/// A customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// Unique across customers, stored normalised (see [`NewCustomer::validate`]).
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn from_draft(id: CustomerId, draft: NewCustomer, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            created_at,
        }
    }

    /// Replace contact fields, keeping identity and creation time.
    pub fn apply_update(&mut self, draft: NewCustomer) {
        self.name = draft.name;
        self.email = draft.email;
        self.phone = draft.phone;
        self.address = draft.address;
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Field set for registering or updating a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl NewCustomer {
    /// Trim fields, lowercase the email and check them.
    pub fn validate(mut self) -> DomainResult<Self> {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self.phone = self.phone.trim().to_string();
        self.address = self.address.trim().to_string();

        if self.name.is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        if !is_plausible_email(&self.email) {
            return Err(DomainError::validation(format!(
                "invalid email address '{}'",
                self.email
            )));
        }
        Ok(self)
    }
}

/// Canonical form used for uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    }
}
