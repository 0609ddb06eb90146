//! HTTP handlers for purchase orders and receiving

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shared::models::{PurchaseOrder, PurchaseOrderStatus, ReceiveItem};
use shared::validation::validate_quantity_bounds;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::{PurchaseOrderService, PurchaseReceivingService};
use crate::AppState;

/// Request body for a manual status change
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: PurchaseOrderStatus,
}

/// Request body for receiving goods
#[derive(Debug, Deserialize, Validate)]
pub struct ReceiveItemsRequest {
    #[validate(length(min = 1, message = "At least one item must be received"))]
    pub items: Vec<ReceiveItem>,
}

/// Get a purchase order with its lines
pub async fn get_purchase_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(purchase_order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchaseOrderService::new(state.db);
    let order = service.get_purchase_order(purchase_order_id).await?;
    Ok(Json(order))
}

/// Change a purchase order's status
pub async fn update_purchase_order_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(purchase_order_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<PurchaseOrder>> {
    current_user.0.require("purchase_orders", "write")?;

    let service = PurchaseOrderService::new(state.db);
    let order = service
        .transition_status(purchase_order_id, request.status)
        .await?;
    Ok(Json(order))
}

/// Receive goods against a purchase order
pub async fn receive_purchase_order_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(purchase_order_id): Path<Uuid>,
    Json(request): Json<ReceiveItemsRequest>,
) -> AppResult<Json<PurchaseOrder>> {
    current_user.0.require("purchase_orders", "receive")?;
    request.validate()?;
    for item in &request.items {
        validate_quantity_bounds(item.received_quantity)
            .map_err(|m| AppError::validation("items", m))?;
    }

    let service = PurchaseReceivingService::new(state.db);
    let order = service
        .receive_items(purchase_order_id, Some(current_user.0.user_id), &request.items)
        .await?;
    Ok(Json(order))
}
