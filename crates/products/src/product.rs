use core::str::FromStr;

use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, Entity, Money, ProductId};

/// Catalog category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Electronics,
    Clothing,
    Home,
    Books,
    Other,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 5] = [
        ProductCategory::Electronics,
        ProductCategory::Clothing,
        ProductCategory::Home,
        ProductCategory::Books,
        ProductCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Electronics => "electronics",
            ProductCategory::Clothing => "clothing",
            ProductCategory::Home => "home",
            ProductCategory::Books => "books",
            ProductCategory::Other => "other",
        }
    }
}

impl core::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown product category '{s}'")))
    }
}

/// A catalog product with its live stock count.
///
/// `stock` is owned by the inventory ledger: outside of administrative edits it
/// only changes through reserve/release inside an order transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Live price. Orders copy it at creation time and never look back.
    pub unit_price: Money,
    pub stock: u32,
    pub category: ProductCategory,
}

impl Product {
    pub fn from_draft(id: ProductId, draft: NewProduct) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            unit_price: draft.unit_price,
            stock: draft.stock,
            category: draft.category,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Field set for creating a product or replacing an existing one's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit_price: Money,
    pub stock: u32,
    pub category: ProductCategory,
}

impl NewProduct {
    /// Trim text fields and check them.
    pub fn validate(mut self) -> DomainResult<Self> {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();

        if self.name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if self.unit_price.is_negative() {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewProduct {
        NewProduct {
            name: "  Desk Lamp ".to_string(),
            description: "LED".to_string(),
            unit_price: "24.99".parse().unwrap(),
            stock: 10,
            category: ProductCategory::Home,
        }
    }

    #[test]
    fn validate_trims_name() {
        let draft = draft().validate().unwrap();
        assert_eq!(draft.name, "Desk Lamp");
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut d = draft();
        d.name = "   ".to_string();
        assert!(matches!(d.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut d = draft();
        d.unit_price = Money::from_minor(-1);
        assert!(d.validate().is_err());
    }

    #[test]
    fn category_strings_round_through_boundary() {
        assert_eq!("books".parse::<ProductCategory>().unwrap(), ProductCategory::Books);
        assert!("toys".parse::<ProductCategory>().is_err());
        let json = serde_json::to_string(&ProductCategory::Electronics).unwrap();
        assert_eq!(json, "\"electronics\"");
    }

    #[test]
    fn from_draft_keeps_fields() {
        let product = Product::from_draft(ProductId::new(3), draft().validate().unwrap());
        assert_eq!(product.id(), ProductId::new(3));
        assert_eq!(product.unit_price.to_string(), "24.99");
        assert!(product.in_stock());
    }
}
