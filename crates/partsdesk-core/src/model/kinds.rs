//! Roles, locations and order statuses.

use crate::error::{CoreError, Result};
use crate::schema::TableName;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ROLES
// =============================================================================

/// The three staff roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    /// Garage staff: sales, customers, garage stock, outgoing orders.
    LocalStaff,
    /// Warehouse staff: warehouse stock, pricing, order fulfilment.
    WarehouseStaff,
    /// Sees and does everything.
    Manager,
}

impl RoleName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalStaff => "local_staff",
            Self::WarehouseStaff => "warehouse_staff",
            Self::Manager => "manager",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "local_staff" => Some(Self::LocalStaff),
            "warehouse_staff" => Some(Self::WarehouseStaff),
            "manager" => Some(Self::Manager),
            _ => None,
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// LOCATIONS
// =============================================================================

/// Which kind of site a location id points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Garage,
    Warehouse,
}

impl LocationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Garage => "garage",
            Self::Warehouse => "warehouse",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "garage" => Ok(Self::Garage),
            "warehouse" => Ok(Self::Warehouse),
            other => Err(CoreError::validation(format!(
                "Invalid location type: {other}"
            ))),
        }
    }

    /// The table holding sites of this kind.
    #[must_use]
    pub const fn table(self) -> TableName {
        match self {
            Self::Garage => TableName::Garages,
            Self::Warehouse => TableName::Warehouses,
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A garage or a warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: LocationType,
    pub id: u64,
}

impl Location {
    #[must_use]
    pub const fn garage(id: u64) -> Self {
        Self {
            kind: LocationType::Garage,
            id,
        }
    }

    #[must_use]
    pub const fn warehouse(id: u64) -> Self {
        Self {
            kind: LocationType::Warehouse,
            id,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

// =============================================================================
// ORDER STATUS
// =============================================================================

/// Lifecycle of an inter-location order.
///
/// ```text
/// pending ──► processing ──► shipped ──► delivered
///    │             │
///    └─────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(CoreError::validation("Invalid status value")),
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
