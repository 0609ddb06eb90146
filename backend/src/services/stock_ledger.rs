//! Stock ledger: the only writer of stock levels
//!
//! Each movement locks the stock item row, applies the ledger arithmetic,
//! writes the new level and appends one immutable movement record, all in
//! the caller's transaction.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use shared::ledger::{apply_movement, MovementRequest};
use shared::models::{MovementType, StockItem, StockMovement, StockReference};

use crate::error::{AppError, AppResult};
use crate::models::{StockItemRow, StockMovementRow, STOCK_ITEM_COLUMNS, STOCK_MOVEMENT_COLUMNS};

/// Stock ledger service
#[derive(Clone)]
pub struct StockLedgerService {
    db: PgPool,
}

/// Input for recording a stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMovementInput {
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reference: Option<StockReference>,
    pub notes: Option<String>,
}

impl StockLedgerService {
    /// Create a new StockLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a movement in its own transaction
    pub async fn record_movement(
        &self,
        stock_item_id: Uuid,
        user_id: Option<Uuid>,
        input: RecordMovementInput,
    ) -> AppResult<StockMovement> {
        let mut tx = self.db.begin().await?;
        let movement = record_movement_in(&mut tx, stock_item_id, user_id, &input).await?;
        tx.commit().await?;

        Ok(movement)
    }
}

/// Lock a stock item for the rest of the transaction
pub async fn lock_stock_item(conn: &mut PgConnection, stock_item_id: Uuid) -> AppResult<StockItem> {
    let row = sqlx::query_as::<_, StockItemRow>(&format!(
        "SELECT {} FROM stock_items WHERE id = $1 FOR UPDATE",
        STOCK_ITEM_COLUMNS
    ))
    .bind(stock_item_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;

    Ok(row.into())
}

/// Record a movement inside an open transaction.
///
/// The stock item row stays locked until the caller commits, so the level
/// read here cannot be overwritten by a concurrent movement.
pub async fn record_movement_in(
    conn: &mut PgConnection,
    stock_item_id: Uuid,
    user_id: Option<Uuid>,
    input: &RecordMovementInput,
) -> AppResult<StockMovement> {
    let item = lock_stock_item(conn, stock_item_id).await?;

    let outcome = apply_movement(
        item.current_stock,
        item.unit_cost,
        &MovementRequest {
            movement_type: input.movement_type,
            quantity: input.quantity,
            unit_cost: input.unit_cost,
        },
    );

    let notes = if outcome.clipped {
        tracing::warn!(
            stock_item_id = %item.id,
            sku = %item.sku,
            requested = %outcome.requested_quantity,
            applied = %outcome.quantity,
            "Stock movement clipped at zero"
        );
        let clip_note = format!(
            "requested {}, clipped at zero stock",
            outcome.requested_quantity.normalize()
        );
        Some(match &input.notes {
            Some(notes) => format!("{} ({})", notes, clip_note),
            None => clip_note,
        })
    } else {
        input.notes.clone()
    };

    sqlx::query(
        r#"
        UPDATE stock_items
        SET current_stock = $1, unit_cost = $2, updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(outcome.stock_after)
    .bind(outcome.new_unit_cost)
    .bind(item.id)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, StockMovementRow>(&format!(
        r#"
        INSERT INTO stock_movements (
            stock_item_id, movement_type, quantity, unit_cost, total_cost,
            stock_before, stock_after, reference_type, reference_id, user_id, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {}
        "#,
        STOCK_MOVEMENT_COLUMNS
    ))
    .bind(item.id)
    .bind(input.movement_type.as_str())
    .bind(outcome.quantity)
    .bind(outcome.unit_cost)
    .bind(outcome.total_cost)
    .bind(outcome.stock_before)
    .bind(outcome.stock_after)
    .bind(input.reference.map(|r| r.reference_type.as_str()))
    .bind(input.reference.map(|r| r.reference_id))
    .bind(user_id)
    .bind(&notes)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(
        stock_item_id = %item.id,
        movement_type = %input.movement_type,
        quantity = %outcome.quantity,
        stock_before = %outcome.stock_before,
        stock_after = %outcome.stock_after,
        "Recorded stock movement"
    );

    row.try_into()
}
