//! HTTP handlers for stock items and the stock ledger

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shared::models::{MovementType, ReferenceType, StockItem, StockMovement, StockReference};
use shared::types::{PaginatedResponse, Pagination};
use shared::validation::{validate_movement_quantity, validate_non_negative};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::stock_item::{CreateStockItemInput, StockItemService, StockValuation};
use crate::services::stock_ledger::{RecordMovementInput, StockLedgerService};
use crate::AppState;

/// Query parameters for listing stock items
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub active_only: Option<bool>,
}

/// Query parameters for paginated history
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        let defaults = Pagination::default();
        Pagination {
            page: q.page.unwrap_or(defaults.page),
            per_page: q.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Request body for a manual stock movement
#[derive(Debug, Deserialize, Validate)]
pub struct RecordMovementRequest {
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reference: Option<StockReference>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// List stock items
pub async fn list_stock_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<StockItem>>> {
    let service = StockItemService::new(state.db);
    let items = service.list_items(query.active_only.unwrap_or(false)).await?;
    Ok(Json(items))
}

/// Create a stock item
pub async fn create_stock_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateStockItemInput>,
) -> AppResult<Json<StockItem>> {
    current_user.0.require("stock", "write")?;

    let service = StockItemService::new(state.db);
    let item = service
        .create_item(Some(current_user.0.user_id), input)
        .await?;
    Ok(Json(item))
}

/// Get a stock item
pub async fn get_stock_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(stock_item_id): Path<Uuid>,
) -> AppResult<Json<StockItem>> {
    let service = StockItemService::new(state.db);
    let item = service.get_item(stock_item_id).await?;
    Ok(Json(item))
}

/// Active items at or below their minimum level
pub async fn get_low_stock_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<StockItem>>> {
    let service = StockItemService::new(state.db);
    let items = service.low_stock_items().await?;
    Ok(Json(items))
}

/// Stock valuation summary
pub async fn get_stock_valuation(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<StockValuation>> {
    let service = StockItemService::new(state.db);
    let valuation = service.valuation().await?;
    Ok(Json(valuation))
}

/// Movement history for a stock item
pub async fn get_movement_history(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(stock_item_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<StockMovement>>> {
    let service = StockItemService::new(state.db);
    let history = service
        .movement_history(stock_item_id, page.into())
        .await?;
    Ok(Json(history))
}

/// Record a manual stock movement
pub async fn record_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(stock_item_id): Path<Uuid>,
    Json(request): Json<RecordMovementRequest>,
) -> AppResult<Json<StockMovement>> {
    current_user.0.require("stock", "write")?;

    request.validate()?;
    validate_movement_quantity(request.movement_type, request.quantity)
        .map_err(|m| AppError::validation("quantity", m))?;
    if let Some(unit_cost) = request.unit_cost {
        validate_non_negative(unit_cost).map_err(|m| AppError::validation("unit_cost", m))?;
    }

    let service = StockLedgerService::new(state.db);
    let movement = service
        .record_movement(
            stock_item_id,
            Some(current_user.0.user_id),
            RecordMovementInput {
                movement_type: request.movement_type,
                quantity: request.quantity,
                unit_cost: request.unit_cost,
                reference: request.reference,
                notes: request.notes,
            },
        )
        .await?;
    Ok(Json(movement))
}

/// Movements caused by one purchase order or ticket
pub async fn get_movements_by_reference(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((reference_type, reference_id)): Path<(String, Uuid)>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let reference_type = ReferenceType::from_str(&reference_type).ok_or_else(|| {
        AppError::validation("reference_type", "Reference type must be purchase_order or ticket")
    })?;

    let service = StockItemService::new(state.db);
    let movements = service
        .movements_by_reference(reference_type, reference_id)
        .await?;
    Ok(Json(movements))
}
