//! Purchase order service: lookups and the manual status workflow

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use shared::models::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus};

use crate::error::{AppError, AppResult};
use crate::models::{PurchaseOrderItemRow, PurchaseOrderRow};

/// Purchase order service
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
}

impl PurchaseOrderService {
    /// Create a new PurchaseOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a purchase order with its lines
    pub async fn get_purchase_order(&self, purchase_order_id: Uuid) -> AppResult<PurchaseOrder> {
        let mut conn = self.db.acquire().await?;
        let (header, items) = fetch_purchase_order(&mut conn, purchase_order_id, false).await?;
        to_purchase_order(header, items)
    }

    /// Move an order along `draft -> pending -> approved -> ordered`, or cancel it
    pub async fn transition_status(
        &self,
        purchase_order_id: Uuid,
        next: PurchaseOrderStatus,
    ) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;
        let (header, items) = fetch_purchase_order(&mut tx, purchase_order_id, true).await?;
        let current = header.status()?;

        if !current.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "Purchase order {} cannot move from {} to {}",
                header.po_number, current, next
            )));
        }

        let header = sqlx::query_as::<_, PurchaseOrderRow>(
            r#"
            UPDATE purchase_orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, po_number, supplier_name, status, created_at, updated_at
            "#,
        )
        .bind(next.as_str())
        .bind(purchase_order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            purchase_order_id = %purchase_order_id,
            from = %current,
            to = %next,
            "Purchase order status changed"
        );

        to_purchase_order(header, items)
    }
}

/// Load an order header and its lines, optionally locking both
pub async fn fetch_purchase_order(
    conn: &mut PgConnection,
    purchase_order_id: Uuid,
    for_update: bool,
) -> AppResult<(PurchaseOrderRow, Vec<PurchaseOrderItem>)> {
    let lock = if for_update { "FOR UPDATE" } else { "" };

    let header = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
        r#"
        SELECT id, po_number, supplier_name, status, created_at, updated_at
        FROM purchase_orders
        WHERE id = $1
        {}
        "#,
        lock
    ))
    .bind(purchase_order_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

    let lock = if for_update { "FOR UPDATE OF poi" } else { "" };
    let items = sqlx::query_as::<_, PurchaseOrderItemRow>(&format!(
        r#"
        SELECT poi.id, poi.purchase_order_id, poi.stock_item_id, si.name AS stock_item_name,
               poi.quantity, poi.unit_cost, poi.received_quantity
        FROM purchase_order_items poi
        JOIN stock_items si ON si.id = poi.stock_item_id
        WHERE poi.purchase_order_id = $1
        ORDER BY poi.created_at, poi.id
        {}
        "#,
        lock
    ))
    .bind(purchase_order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok((header, items.into_iter().map(Into::into).collect()))
}

pub fn to_purchase_order(
    header: PurchaseOrderRow,
    items: Vec<PurchaseOrderItem>,
) -> AppResult<PurchaseOrder> {
    Ok(PurchaseOrder {
        status: header.status()?,
        id: header.id,
        po_number: header.po_number,
        supplier_name: header.supplier_name,
        items,
        created_at: header.created_at,
        updated_at: header.updated_at,
    })
}
