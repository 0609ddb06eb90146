//! HTTP handlers for ticket completion and material consumption

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::ProductionStockConsumption;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::production_consumption::ConsumptionResult;
use crate::services::ticket::TicketCompletion;
use crate::services::{ProductionConsumptionService, TicketService};
use crate::AppState;

/// Complete a ticket and consume its materials
pub async fn complete_ticket(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<TicketCompletion>> {
    current_user.0.require("tickets", "complete")?;

    let service = TicketService::new(state.db);
    let completion = service
        .complete_ticket(ticket_id, Some(current_user.0.user_id))
        .await?;
    Ok(Json(completion))
}

/// Run material consumption for a ticket
pub async fn consume_ticket_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<ConsumptionResult>> {
    current_user.0.require("production", "consume")?;

    let service = ProductionConsumptionService::new(state.db);
    let result = service
        .auto_consume_stock_for_production(ticket_id, Some(current_user.0.user_id))
        .await?;
    Ok(Json(result))
}

/// List consumption records for a ticket
pub async fn list_ticket_consumptions(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<Vec<ProductionStockConsumption>>> {
    let service = ProductionConsumptionService::new(state.db);
    let consumptions = service.list_consumptions(ticket_id).await?;
    Ok(Json(consumptions))
}
