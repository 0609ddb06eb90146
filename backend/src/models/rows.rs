//! Row types and their conversion into domain models
//!
//! Status and type columns are stored as text; an unknown value in the
//! database is an internal error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use shared::models::{
    JobTypeStockRequirement, MovementType, ProductionStockConsumption, PurchaseOrderItem,
    PurchaseOrderStatus, ReferenceType, StockItem, StockMovement, StockReference, Ticket,
    TicketStatus,
};

use crate::error::AppError;

/// Columns selected for a stock item
pub const STOCK_ITEM_COLUMNS: &str = "id, sku, name, unit, current_stock, unit_cost, \
     minimum_stock_level, is_area_based, length, width, job_type_id, is_active, created_at, updated_at";

/// Columns selected for a stock movement
pub const STOCK_MOVEMENT_COLUMNS: &str = "id, stock_item_id, movement_type, quantity, unit_cost, \
     total_cost, stock_before, stock_after, reference_type, reference_id, user_id, notes, created_at";

/// Columns selected for a consumption record
pub const CONSUMPTION_COLUMNS: &str = "id, ticket_id, stock_item_id, quantity_consumed, unit_cost, \
     total_cost, notes, consumed_by, created_at";

#[derive(Debug, FromRow)]
pub struct StockItemRow {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub current_stock: Decimal,
    pub unit_cost: Decimal,
    pub minimum_stock_level: Decimal,
    pub is_area_based: bool,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub job_type_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StockItemRow> for StockItem {
    fn from(r: StockItemRow) -> Self {
        StockItem {
            id: r.id,
            sku: r.sku,
            name: r.name,
            unit: r.unit,
            current_stock: r.current_stock,
            unit_cost: r.unit_cost,
            minimum_stock_level: r.minimum_stock_level,
            is_area_based: r.is_area_based,
            length: r.length,
            width: r.width,
            job_type_id: r.job_type_id,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct StockMovementRow {
    pub id: Uuid,
    pub stock_item_id: Uuid,
    pub movement_type: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<StockMovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(r: StockMovementRow) -> Result<Self, Self::Error> {
        let movement_type = MovementType::from_str(&r.movement_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown movement type '{}'", r.movement_type))
        })?;

        let reference = match (r.reference_type.as_deref(), r.reference_id) {
            (Some(kind), Some(reference_id)) => {
                let reference_type = ReferenceType::from_str(kind).ok_or_else(|| {
                    AppError::Internal(format!("Unknown reference type '{}'", kind))
                })?;
                Some(StockReference {
                    reference_type,
                    reference_id,
                })
            }
            _ => None,
        };

        Ok(StockMovement {
            id: r.id,
            stock_item_id: r.stock_item_id,
            movement_type,
            quantity: r.quantity,
            unit_cost: r.unit_cost,
            total_cost: r.total_cost,
            stock_before: r.stock_before,
            stock_after: r.stock_after,
            reference,
            user_id: r.user_id,
            notes: r.notes,
            created_at: r.created_at,
        })
    }
}

/// Purchase order header
#[derive(Debug, FromRow)]
pub struct PurchaseOrderRow {
    pub id: Uuid,
    pub po_number: String,
    pub supplier_name: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrderRow {
    pub fn status(&self) -> Result<PurchaseOrderStatus, AppError> {
        PurchaseOrderStatus::from_str(&self.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown purchase order status '{}'", self.status))
        })
    }
}

/// Purchase order line joined with its stock item name
#[derive(Debug, FromRow)]
pub struct PurchaseOrderItemRow {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub stock_item_id: Uuid,
    pub stock_item_name: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub received_quantity: Decimal,
}

impl From<PurchaseOrderItemRow> for PurchaseOrderItem {
    fn from(r: PurchaseOrderItemRow) -> Self {
        PurchaseOrderItem {
            id: r.id,
            purchase_order_id: r.purchase_order_id,
            stock_item_id: r.stock_item_id,
            stock_item_name: r.stock_item_name,
            quantity: r.quantity,
            unit_cost: r.unit_cost,
            received_quantity: r.received_quantity,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct TicketRow {
    pub id: Uuid,
    pub ticket_number: String,
    pub job_type_id: Option<Uuid>,
    pub quantity: i32,
    pub size_value: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = AppError;

    fn try_from(r: TicketRow) -> Result<Self, Self::Error> {
        let status = TicketStatus::from_str(&r.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown ticket status '{}'", r.status)))?;

        Ok(Ticket {
            id: r.id,
            ticket_number: r.ticket_number,
            job_type_id: r.job_type_id,
            quantity: r.quantity,
            size_value: r.size_value,
            status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct RequirementRow {
    pub id: Uuid,
    pub job_type_id: Uuid,
    pub stock_item_id: Uuid,
    pub quantity_per_unit: Decimal,
    pub is_required: bool,
}

impl From<RequirementRow> for JobTypeStockRequirement {
    fn from(r: RequirementRow) -> Self {
        JobTypeStockRequirement {
            id: r.id,
            job_type_id: r.job_type_id,
            stock_item_id: r.stock_item_id,
            quantity_per_unit: r.quantity_per_unit,
            is_required: r.is_required,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ConsumptionRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub stock_item_id: Uuid,
    pub quantity_consumed: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub notes: Option<String>,
    pub consumed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<ConsumptionRow> for ProductionStockConsumption {
    fn from(r: ConsumptionRow) -> Self {
        ProductionStockConsumption {
            id: r.id,
            ticket_id: r.ticket_id,
            stock_item_id: r.stock_item_id,
            quantity_consumed: r.quantity_consumed,
            unit_cost: r.unit_cost,
            total_cost: r.total_cost,
            notes: r.notes,
            consumed_by: r.consumed_by,
            created_at: r.created_at,
        }
    }
}
