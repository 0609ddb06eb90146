//! Automatic material consumption for completed production tickets

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use shared::consumption::{default_quantity_per_unit, plan_consumption, settle_outcome};
use shared::models::{
    JobTypeStockRequirement, MovementType, ProductionStockConsumption, StockItem, StockReference,
    Ticket,
};

use crate::error::{AppError, AppResult};
use crate::models::{
    ConsumptionRow, RequirementRow, StockItemRow, TicketRow, CONSUMPTION_COLUMNS,
    STOCK_ITEM_COLUMNS,
};
use crate::services::stock_ledger::{record_movement_in, RecordMovementInput};

/// Production consumption service
#[derive(Clone)]
pub struct ProductionConsumptionService {
    db: PgPool,
}

/// Consumptions created by one run, plus materials that were skipped
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsumptionResult {
    pub consumptions: Vec<ProductionStockConsumption>,
    pub warnings: Vec<String>,
}

impl ProductionConsumptionService {
    /// Create a new ProductionConsumptionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Consume the materials a ticket's job type requires, at most once per material.
    ///
    /// Materials that are missing, inactive or short are skipped with a
    /// warning. The run fails and rolls back only when every material was
    /// skipped for one of those reasons.
    pub async fn auto_consume_stock_for_production(
        &self,
        ticket_id: Uuid,
        user_id: Option<Uuid>,
    ) -> AppResult<ConsumptionResult> {
        let ticket = fetch_ticket(&self.db, ticket_id).await?;
        if !ticket.status.consumes_stock() {
            return Err(AppError::InvalidStateTransition(format!(
                "Ticket {} is {} and cannot consume stock until completed",
                ticket.ticket_number, ticket.status
            )));
        }

        let Some(job_type_id) = ticket.job_type_id else {
            tracing::debug!(ticket_id = %ticket.id, "Ticket has no job type, nothing to consume");
            return Ok(ConsumptionResult::default());
        };

        let requirements = self.resolve_requirements(job_type_id).await?;
        if requirements.is_empty() {
            tracing::debug!(ticket_id = %ticket.id, "Job type has no stock requirements");
            return Ok(ConsumptionResult::default());
        }

        let mut tx = self.db.begin().await?;

        let item_ids: Vec<Uuid> = requirements.iter().map(|r| r.stock_item_id).collect();
        let items = lock_stock_items(&mut tx, &item_ids).await?;
        let already_consumed = consumed_stock_items(&mut tx, ticket.id).await?;

        let plan = plan_consumption(&ticket, &requirements, &items, &already_consumed);

        let mut consumptions = Vec::with_capacity(plan.consumptions.len());
        for planned in &plan.consumptions {
            let inserted = sqlx::query_as::<_, ConsumptionRow>(&format!(
                r#"
                INSERT INTO production_stock_consumptions (
                    ticket_id, stock_item_id, quantity_consumed, unit_cost, total_cost, notes, consumed_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (ticket_id, stock_item_id) DO NOTHING
                RETURNING {}
                "#,
                CONSUMPTION_COLUMNS
            ))
            .bind(ticket.id)
            .bind(planned.stock_item_id)
            .bind(planned.quantity)
            .bind(planned.unit_cost)
            .bind(planned.total_cost)
            .bind(&planned.notes)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

            // Another request consumed this material first
            let Some(row) = inserted else {
                continue;
            };

            record_movement_in(
                &mut tx,
                planned.stock_item_id,
                user_id,
                &RecordMovementInput {
                    movement_type: MovementType::Out,
                    quantity: planned.quantity,
                    unit_cost: None,
                    reference: Some(StockReference::ticket(ticket.id)),
                    notes: Some(planned.notes.clone()),
                },
            )
            .await?;

            consumptions.push(row.into());
        }

        // Returning early drops `tx`, rolling the run back
        let warnings = settle_outcome(consumptions.len(), plan.errors)?;

        tx.commit().await?;

        for warning in &warnings {
            tracing::warn!(ticket_id = %ticket.id, "Stock consumption skipped: {}", warning);
        }
        tracing::info!(
            ticket_id = %ticket.id,
            consumed = consumptions.len(),
            skipped = warnings.len(),
            "Production stock consumption completed"
        );

        Ok(ConsumptionResult {
            consumptions,
            warnings,
        })
    }

    /// List the consumptions recorded for a ticket
    pub async fn list_consumptions(&self, ticket_id: Uuid) -> AppResult<Vec<ProductionStockConsumption>> {
        let rows = sqlx::query_as::<_, ConsumptionRow>(&format!(
            r#"
            SELECT {}
            FROM production_stock_consumptions
            WHERE ticket_id = $1
            ORDER BY created_at
            "#,
            CONSUMPTION_COLUMNS
        ))
        .bind(ticket_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Required materials for a job type.
    ///
    /// Without explicit requirements, every stock item linked to the job type
    /// becomes one, and the inferred requirement is stored for next time.
    async fn resolve_requirements(&self, job_type_id: Uuid) -> AppResult<Vec<JobTypeStockRequirement>> {
        let explicit = sqlx::query_as::<_, RequirementRow>(
            r#"
            SELECT id, job_type_id, stock_item_id, quantity_per_unit, is_required
            FROM job_type_stock_requirements
            WHERE job_type_id = $1 AND is_required = true
            ORDER BY created_at, id
            "#,
        )
        .bind(job_type_id)
        .fetch_all(&self.db)
        .await?;

        if !explicit.is_empty() {
            return Ok(explicit.into_iter().map(Into::into).collect());
        }

        let linked = sqlx::query_as::<_, StockItemRow>(&format!(
            "SELECT {} FROM stock_items WHERE job_type_id = $1 ORDER BY name",
            STOCK_ITEM_COLUMNS
        ))
        .bind(job_type_id)
        .fetch_all(&self.db)
        .await?;

        let mut requirements = Vec::with_capacity(linked.len());
        for row in linked {
            let item = StockItem::from(row);
            let requirement = sqlx::query_as::<_, RequirementRow>(
                r#"
                INSERT INTO job_type_stock_requirements (job_type_id, stock_item_id, quantity_per_unit, is_required)
                VALUES ($1, $2, $3, true)
                ON CONFLICT (job_type_id, stock_item_id)
                DO UPDATE SET job_type_id = EXCLUDED.job_type_id
                RETURNING id, job_type_id, stock_item_id, quantity_per_unit, is_required
                "#,
            )
            .bind(job_type_id)
            .bind(item.id)
            .bind(default_quantity_per_unit(&item))
            .fetch_one(&self.db)
            .await?;

            tracing::info!(
                job_type_id = %job_type_id,
                stock_item_id = %item.id,
                "Inferred stock requirement from job type link"
            );
            requirements.push(requirement.into());
        }

        Ok(requirements)
    }
}

/// Load a ticket by ID
pub async fn fetch_ticket(db: &PgPool, ticket_id: Uuid) -> AppResult<Ticket> {
    sqlx::query_as::<_, TicketRow>(
        r#"
        SELECT id, ticket_number, job_type_id, quantity, size_value, status, created_at, updated_at
        FROM tickets
        WHERE id = $1
        "#,
    )
    .bind(ticket_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound("Ticket".to_string()))?
    .try_into()
}

/// Lock the given stock items, keyed by ID; unknown IDs are absent
async fn lock_stock_items(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, StockItem>> {
    let rows = sqlx::query_as::<_, StockItemRow>(&format!(
        "SELECT {} FROM stock_items WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        STOCK_ITEM_COLUMNS
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.id, StockItem::from(row)))
        .collect())
}

/// Stock items this ticket has already consumed
async fn consumed_stock_items(conn: &mut PgConnection, ticket_id: Uuid) -> AppResult<HashSet<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT stock_item_id FROM production_stock_consumptions WHERE ticket_id = $1",
    )
    .bind(ticket_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids.into_iter().collect())
}
