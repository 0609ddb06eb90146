//! Route definitions for the print shop back office

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - stock items and ledger
        .nest("/stock", stock_routes(state.clone()))
        // Protected routes - purchase orders
        .nest("/purchase-orders", purchase_order_routes(state.clone()))
        // Protected routes - production tickets
        .nest("/tickets", ticket_routes(state))
}

/// Stock item and movement routes (protected)
fn stock_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/items",
            get(handlers::list_stock_items).post(handlers::create_stock_item),
        )
        .route("/items/low", get(handlers::get_low_stock_items))
        .route("/valuation", get(handlers::get_stock_valuation))
        .route("/items/:stock_item_id", get(handlers::get_stock_item))
        .route(
            "/items/:stock_item_id/movements",
            get(handlers::get_movement_history).post(handlers::record_movement),
        )
        .route(
            "/movements/by-reference/:reference_type/:reference_id",
            get(handlers::get_movements_by_reference),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Purchase order routes (protected)
fn purchase_order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:purchase_order_id", get(handlers::get_purchase_order))
        .route(
            "/:purchase_order_id/status",
            put(handlers::update_purchase_order_status),
        )
        .route(
            "/:purchase_order_id/receive",
            post(handlers::receive_purchase_order_items),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Ticket production routes (protected)
fn ticket_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:ticket_id/complete", post(handlers::complete_ticket))
        .route("/:ticket_id/consume", post(handlers::consume_ticket_stock))
        .route(
            "/:ticket_id/consumptions",
            get(handlers::list_ticket_consumptions),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
