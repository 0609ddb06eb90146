//! Stock item service: catalogue, reports and movement history

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{MovementType, ReferenceType, StockItem, StockMovement};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{
    validate_area_dimensions, validate_non_negative, validate_quantity_bounds, validate_sku,
};

use crate::error::{AppError, AppResult};
use crate::models::{StockItemRow, StockMovementRow, STOCK_ITEM_COLUMNS, STOCK_MOVEMENT_COLUMNS};
use crate::services::stock_ledger::{record_movement_in, RecordMovementInput};

/// Stock item service
#[derive(Clone)]
pub struct StockItemService {
    db: PgPool,
}

/// Input for creating a stock item
#[derive(Debug, Deserialize)]
pub struct CreateStockItemInput {
    pub sku: String,
    pub name: String,
    pub unit: Option<String>,
    pub unit_cost: Decimal,
    pub minimum_stock_level: Option<Decimal>,
    pub is_area_based: Option<bool>,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub job_type_id: Option<Uuid>,
    /// Booked as an `in` movement so the ledger starts from zero
    pub opening_stock: Option<Decimal>,
}

/// Stock valuation across active items
#[derive(Debug, Clone, Serialize)]
pub struct StockValuation {
    pub item_count: i64,
    pub total_value: Decimal,
    pub low_stock_count: i64,
}

impl StockItemService {
    /// Create a new StockItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a stock item, booking any opening stock through the ledger
    pub async fn create_item(
        &self,
        user_id: Option<Uuid>,
        input: CreateStockItemInput,
    ) -> AppResult<StockItem> {
        validate_sku(&input.sku).map_err(|m| AppError::validation("sku", m))?;
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Name is required"));
        }
        validate_non_negative(input.unit_cost).map_err(|m| AppError::validation("unit_cost", m))?;

        let minimum_stock_level = input.minimum_stock_level.unwrap_or(Decimal::ZERO);
        validate_non_negative(minimum_stock_level)
            .map_err(|m| AppError::validation("minimum_stock_level", m))?;

        let is_area_based = input.is_area_based.unwrap_or(false);
        validate_area_dimensions(is_area_based, input.length, input.width)
            .map_err(|m| AppError::validation("length/width", m))?;

        let opening_stock = input.opening_stock.unwrap_or(Decimal::ZERO);
        validate_non_negative(opening_stock)
            .and_then(|_| validate_quantity_bounds(opening_stock))
            .map_err(|m| AppError::validation("opening_stock", m))?;

        let mut tx = self.db.begin().await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_items (
                sku, name, unit, unit_cost, minimum_stock_level, is_area_based, length, width, job_type_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&input.sku)
        .bind(input.name.trim())
        .bind(input.unit.as_deref().unwrap_or("pcs"))
        .bind(input.unit_cost)
        .bind(minimum_stock_level)
        .bind(is_area_based)
        .bind(input.length)
        .bind(input.width)
        .bind(input.job_type_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::DuplicateEntry("sku".to_string())
            }
            e => e.into(),
        })?;

        if opening_stock > Decimal::ZERO {
            record_movement_in(
                &mut tx,
                id,
                user_id,
                &RecordMovementInput {
                    movement_type: MovementType::In,
                    quantity: opening_stock,
                    unit_cost: Some(input.unit_cost),
                    reference: None,
                    notes: Some("Opening stock".to_string()),
                },
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(stock_item_id = %id, sku = %input.sku, "Stock item created");

        self.get_item(id).await
    }

    /// Get a stock item by ID
    pub async fn get_item(&self, stock_item_id: Uuid) -> AppResult<StockItem> {
        let row = sqlx::query_as::<_, StockItemRow>(&format!(
            "SELECT {} FROM stock_items WHERE id = $1",
            STOCK_ITEM_COLUMNS
        ))
        .bind(stock_item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;

        Ok(row.into())
    }

    /// List stock items, optionally only active ones
    pub async fn list_items(&self, active_only: bool) -> AppResult<Vec<StockItem>> {
        let rows = sqlx::query_as::<_, StockItemRow>(&format!(
            r#"
            SELECT {}
            FROM stock_items
            WHERE ($1 = false OR is_active = true)
            ORDER BY name
            "#,
            STOCK_ITEM_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Active items at or below their minimum stock level
    pub async fn low_stock_items(&self) -> AppResult<Vec<StockItem>> {
        let rows = sqlx::query_as::<_, StockItemRow>(&format!(
            r#"
            SELECT {}
            FROM stock_items
            WHERE is_active = true AND current_stock <= minimum_stock_level
            ORDER BY current_stock - minimum_stock_level, name
            "#,
            STOCK_ITEM_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Value of stock on hand at weighted average cost
    pub async fn valuation(&self) -> AppResult<StockValuation> {
        let items = self.list_items(true).await?;

        Ok(StockValuation {
            item_count: items.len() as i64,
            total_value: items.iter().map(StockItem::stock_value).sum(),
            low_stock_count: items.iter().filter(|i| i.is_low_stock()).count() as i64,
        })
    }

    /// Movement history for a stock item, newest first
    pub async fn movement_history(
        &self,
        stock_item_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<StockMovement>> {
        // 404 for unknown items rather than an empty page
        self.get_item(stock_item_id).await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_movements WHERE stock_item_id = $1",
        )
        .bind(stock_item_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, StockMovementRow>(&format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE stock_item_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            STOCK_MOVEMENT_COLUMNS
        ))
        .bind(stock_item_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<AppResult<Vec<_>>>()?,
            pagination: PaginationMeta::new(&pagination, total.max(0) as u64),
        })
    }

    /// Every movement caused by one purchase order or ticket
    pub async fn movements_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: Uuid,
    ) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, StockMovementRow>(&format!(
            r#"
            SELECT {}
            FROM stock_movements
            WHERE reference_type = $1 AND reference_id = $2
            ORDER BY created_at, id
            "#,
            STOCK_MOVEMENT_COLUMNS
        ))
        .bind(reference_type.as_str())
        .bind(reference_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
