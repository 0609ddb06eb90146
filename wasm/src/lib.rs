//! WebAssembly module for the print shop back office
//!
//! Provides client-side previews for:
//! - Stock movements and weighted average costing
//! - Goods receipts against a purchase order
//! - Ticket material consumption and production area

use std::collections::{HashMap, HashSet};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::consumption::*;
pub use shared::ledger::*;
pub use shared::models::*;
pub use shared::receiving::*;
pub use shared::types::*;
pub use shared::validation::*;

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn js_error(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, e))
}

/// Preview a stock movement; returns the outcome as JSON
#[wasm_bindgen]
pub fn preview_stock_movement(
    stock_before: f64,
    current_unit_cost: f64,
    movement_type: &str,
    quantity: f64,
    unit_cost: Option<f64>,
) -> Result<String, JsValue> {
    let movement_type = MovementType::from_str(movement_type)
        .ok_or_else(|| js_error("Invalid movement type", movement_type))?;

    let outcome = apply_movement(
        to_decimal(stock_before),
        to_decimal(current_unit_cost),
        &MovementRequest {
            movement_type,
            quantity: to_decimal(quantity),
            unit_cost: unit_cost.map(to_decimal),
        },
    );

    serde_json::to_string(&outcome).map_err(|e| js_error("Serialization failed", e))
}

/// Unit cost after receiving `quantity_in` at `new_cost`
#[wasm_bindgen]
pub fn calculate_weighted_average_cost(
    stock_before: f64,
    old_cost: f64,
    quantity_in: f64,
    new_cost: f64,
) -> f64 {
    to_f64(weighted_average_cost(
        to_decimal(stock_before),
        to_decimal(old_cost),
        to_decimal(quantity_in),
        to_decimal(new_cost),
    ))
}

/// Production area of a ticket, 0 when the size text holds no usable dimensions
#[wasm_bindgen]
pub fn calculate_production_area(size_value: &str, ticket_quantity: i32) -> f64 {
    ProductionDimensions::parse(size_value)
        .and_then(|dims| dims.area()?.checked_mul(Decimal::from(ticket_quantity)))
        .map(to_f64)
        .unwrap_or(0.0)
}

/// Check a receipt against the order lines; returns the plan as JSON
#[wasm_bindgen]
pub fn preview_receipt(status: &str, items_json: &str, received_json: &str) -> Result<String, JsValue> {
    let status = PurchaseOrderStatus::from_str(status)
        .ok_or_else(|| js_error("Invalid purchase order status", status))?;
    let items: Vec<PurchaseOrderItem> =
        serde_json::from_str(items_json).map_err(|e| js_error("Invalid items JSON", e))?;
    let received: Vec<ReceiveItem> =
        serde_json::from_str(received_json).map_err(|e| js_error("Invalid receipt JSON", e))?;

    let plan = plan_receipt(status, &items, &received).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&plan).map_err(|e| js_error("Serialization failed", e))
}

/// Plan a ticket's material consumption; returns the plan as JSON
#[wasm_bindgen]
pub fn preview_consumption(
    ticket_json: &str,
    requirements_json: &str,
    items_json: &str,
) -> Result<String, JsValue> {
    let ticket: Ticket =
        serde_json::from_str(ticket_json).map_err(|e| js_error("Invalid ticket JSON", e))?;
    let requirements: Vec<JobTypeStockRequirement> = serde_json::from_str(requirements_json)
        .map_err(|e| js_error("Invalid requirements JSON", e))?;
    let items: Vec<StockItem> =
        serde_json::from_str(items_json).map_err(|e| js_error("Invalid stock items JSON", e))?;

    let items: HashMap<_, _> = items.into_iter().map(|i| (i.id, i)).collect();
    let plan = plan_consumption(&ticket, &requirements, &items, &HashSet::new());

    serde_json::to_string(&plan).map_err(|e| js_error("Serialization failed", e))
}

/// Validate a SKU before submitting a new stock item
#[wasm_bindgen]
pub fn is_valid_sku(sku: &str) -> bool {
    validate_sku(sku).is_ok()
}
