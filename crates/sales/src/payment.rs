use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, Entity, Money, OrderId, PaymentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    BankTransfer,
    Cash,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Paypal,
        PaymentMethod::BankTransfer,
        PaymentMethod::Cash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown payment method '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    #[default]
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Only completed payments count towards revenue or advance an order.
    pub fn is_effective(&self) -> bool {
        matches!(self, PaymentStatus::Completed)
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown payment status '{s}'")))
    }
}

/// A recorded payment against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub payment_date: NaiveDate,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn from_draft(id: PaymentId, draft: NewPayment) -> Self {
        Self {
            id,
            order_id: draft.order_id,
            payment_date: draft.payment_date,
            amount: draft.amount,
            method: draft.method,
            status: draft.status,
        }
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub status: PaymentStatus,
}

impl NewPayment {
    pub fn validate(self) -> DomainResult<Self> {
        if self.amount.is_negative() || self.amount.is_zero() {
            return Err(DomainError::validation(format!(
                "payment amount must be positive, got {}",
                self.amount
            )));
        }
        Ok(self)
    }
}
