//! Purchase order receiving
//!
//! Books received goods into stock. The receipt is validated against every
//! line before the first write and the whole receipt shares one
//! transaction, so a rejected line leaves the order and stock untouched.

use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{MovementType, PurchaseOrder, ReceiveItem, StockReference};
use shared::receiving::plan_receipt;

use crate::error::AppResult;
use crate::services::purchase_order::{fetch_purchase_order, to_purchase_order};
use crate::services::stock_ledger::{record_movement_in, RecordMovementInput};

/// Purchase receiving service
#[derive(Clone)]
pub struct PurchaseReceivingService {
    db: PgPool,
}

impl PurchaseReceivingService {
    /// Create a new PurchaseReceivingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Receive quantities against a purchase order's lines
    pub async fn receive_items(
        &self,
        purchase_order_id: Uuid,
        user_id: Option<Uuid>,
        received: &[ReceiveItem],
    ) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let (header, mut items) = fetch_purchase_order(&mut tx, purchase_order_id, true).await?;
        let plan = plan_receipt(header.status()?, &items, received)?;

        for line in &plan.lines {
            sqlx::query(
                r#"
                UPDATE purchase_order_items
                SET received_quantity = $1, updated_at = NOW()
                WHERE id = $2
                "#,
            )
            .bind(line.received_quantity)
            .bind(line.item_id)
            .execute(&mut *tx)
            .await?;

            record_movement_in(
                &mut tx,
                line.stock_item_id,
                user_id,
                &RecordMovementInput {
                    movement_type: MovementType::In,
                    quantity: line.quantity,
                    unit_cost: Some(line.unit_cost),
                    reference: Some(StockReference::purchase_order(purchase_order_id)),
                    notes: Some(format!("Received against PO {}", header.po_number)),
                },
            )
            .await?;

            if let Some(item) = items.iter_mut().find(|i| i.id == line.item_id) {
                item.received_quantity = line.received_quantity;
            }
        }

        let header = sqlx::query_as::<_, crate::models::PurchaseOrderRow>(
            r#"
            UPDATE purchase_orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, po_number, supplier_name, status, created_at, updated_at
            "#,
        )
        .bind(plan.status.as_str())
        .bind(purchase_order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            purchase_order_id = %purchase_order_id,
            lines = plan.lines.len(),
            status = %plan.status,
            "Purchase order receipt booked"
        );

        to_purchase_order(header, items)
    }
}
