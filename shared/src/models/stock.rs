//! Stock item and stock movement models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A material kept in stock (paper, ink, tarpaulin rolls, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    /// Unit of measure for `current_stock` (e.g. "roll", "sheet", "pcs")
    pub unit: String,
    pub current_stock: Decimal,
    /// Weighted average cost per unit
    pub unit_cost: Decimal,
    pub minimum_stock_level: Decimal,
    /// Consumed by area rather than by piece count
    pub is_area_based: bool,
    /// Length of one unit of stock, required when area-based
    pub length: Option<Decimal>,
    /// Width of one unit of stock, required when area-based
    pub width: Option<Decimal>,
    /// Job type this material is linked to when no explicit requirement exists
    pub job_type_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Area covered by one unit of stock, when both dimensions are known
    pub fn unit_area(&self) -> Option<Decimal> {
        self.length?.checked_mul(self.width?)
    }

    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.minimum_stock_level
    }

    pub fn stock_value(&self) -> Decimal {
        self.current_stock * self.unit_cost
    }
}

/// Kind of change a movement applies to a stock item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementType::In),
            "out" => Some(MovementType::Out),
            "adjustment" => Some(MovementType::Adjustment),
            _ => None,
        }
    }

    /// Contribution of a recorded movement quantity to the stock level.
    ///
    /// `in` and `out` quantities are stored as magnitudes, adjustments keep
    /// their sign.
    pub fn signed_quantity(&self, quantity: Decimal) -> Decimal {
        match self {
            MovementType::In => quantity.abs(),
            MovementType::Out => -quantity.abs(),
            MovementType::Adjustment => quantity,
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity that caused a movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    PurchaseOrder,
    Ticket,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::PurchaseOrder => "purchase_order",
            ReferenceType::Ticket => "ticket",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase_order" => Some(ReferenceType::PurchaseOrder),
            "ticket" => Some(ReferenceType::Ticket),
            _ => None,
        }
    }
}

/// Polymorphic pointer from a movement to its cause
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockReference {
    pub reference_type: ReferenceType,
    pub reference_id: Uuid,
}

impl StockReference {
    pub fn purchase_order(id: Uuid) -> Self {
        Self {
            reference_type: ReferenceType::PurchaseOrder,
            reference_id: id,
        }
    }

    pub fn ticket(id: Uuid) -> Self {
        Self {
            reference_type: ReferenceType::Ticket,
            reference_id: id,
        }
    }
}

/// Immutable audit record of one change to a stock item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub stock_item_id: Uuid,
    pub movement_type: MovementType,
    /// Effective change; signed for adjustments, a magnitude otherwise
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub reference: Option<StockReference>,
    pub user_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
