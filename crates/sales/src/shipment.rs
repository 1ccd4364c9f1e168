use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, Entity, OrderId, ShipmentId};

use crate::order::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Carrier {
    Ups,
    Fedex,
    Usps,
    Dhl,
    Other,
}

impl Carrier {
    pub const ALL: [Carrier; 5] = [
        Carrier::Ups,
        Carrier::Fedex,
        Carrier::Usps,
        Carrier::Dhl,
        Carrier::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Ups => "ups",
            Carrier::Fedex => "fedex",
            Carrier::Usps => "usps",
            Carrier::Dhl => "dhl",
            Carrier::Other => "other",
        }
    }
}

impl core::fmt::Display for Carrier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Carrier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown carrier '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Preparing,
    Shipped,
    #[default]
    InTransit,
    Delivered,
    Returned,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 5] = [
        ShipmentStatus::Preparing,
        ShipmentStatus::Shipped,
        ShipmentStatus::InTransit,
        ShipmentStatus::Delivered,
        ShipmentStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Preparing => "preparing",
            ShipmentStatus::Shipped => "shipped",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Returned => "returned",
        }
    }

    /// Order status an update to this shipment status implies, if any.
    pub fn order_status_effect(&self) -> Option<OrderStatus> {
        match self {
            ShipmentStatus::Delivered => Some(OrderStatus::Delivered),
            ShipmentStatus::Returned => Some(OrderStatus::Returned),
            _ => None,
        }
    }
}

impl core::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown shipment status '{s}'")))
    }
}

/// A recorded shipment of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub ship_date: NaiveDate,
    pub carrier: Carrier,
    pub tracking_number: String,
    pub status: ShipmentStatus,
}

impl Shipment {
    pub fn from_draft(id: ShipmentId, draft: NewShipment) -> Self {
        Self {
            id,
            order_id: draft.order_id,
            ship_date: draft.ship_date,
            carrier: draft.carrier,
            tracking_number: draft.tracking_number,
            status: draft.status,
        }
    }
}

impl Entity for Shipment {
    type Id = ShipmentId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShipment {
    pub order_id: OrderId,
    pub carrier: Carrier,
    pub tracking_number: String,
    pub ship_date: NaiveDate,
    #[serde(default)]
    pub status: ShipmentStatus,
}

impl NewShipment {
    pub fn validate(mut self) -> DomainResult<Self> {
        self.tracking_number = self.tracking_number.trim().to_string();
        if self.tracking_number.is_empty() {
            return Err(DomainError::validation("tracking number cannot be empty"));
        }
        Ok(self)
    }
}
