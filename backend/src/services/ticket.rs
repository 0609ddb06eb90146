//! Ticket completion

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{ProductionStockConsumption, Ticket, TicketStatus};

use crate::error::{AppError, AppResult};
use crate::models::TicketRow;
use crate::services::production_consumption::{fetch_ticket, ProductionConsumptionService};

/// Ticket service
#[derive(Clone)]
pub struct TicketService {
    db: PgPool,
}

/// Completed ticket with the outcome of its material consumption
#[derive(Debug, Clone, Serialize)]
pub struct TicketCompletion {
    pub ticket: Ticket,
    pub consumptions: Vec<ProductionStockConsumption>,
    pub warnings: Vec<String>,
}

impl TicketService {
    /// Create a new TicketService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Mark a ticket completed, then consume its materials.
    ///
    /// Completion is committed first; a consumption failure is reported as a
    /// warning and never reverts the ticket.
    pub async fn complete_ticket(
        &self,
        ticket_id: Uuid,
        user_id: Option<Uuid>,
    ) -> AppResult<TicketCompletion> {
        let updated = sqlx::query_as::<_, TicketRow>(
            r#"
            UPDATE tickets
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND status = ANY($2)
            RETURNING id, ticket_number, job_type_id, quantity, size_value, status, created_at, updated_at
            "#,
        )
        .bind(ticket_id)
        .bind(TicketStatus::completable())
        .fetch_optional(&self.db)
        .await?;

        let ticket: Ticket = match updated {
            Some(row) => row.try_into()?,
            None => {
                let existing = fetch_ticket(&self.db, ticket_id).await?;
                return Err(AppError::InvalidStateTransition(format!(
                    "Ticket {} is {} and cannot be completed",
                    existing.ticket_number, existing.status
                )));
            }
        };

        tracing::info!(ticket_id = %ticket.id, ticket_number = %ticket.ticket_number, "Ticket completed");

        let consumption = ProductionConsumptionService::new(self.db.clone());
        let (consumptions, warnings) = match consumption
            .auto_consume_stock_for_production(ticket.id, user_id)
            .await
        {
            Ok(result) => (result.consumptions, result.warnings),
            Err(AppError::InsufficientStock(failure)) => {
                tracing::warn!(
                    ticket_id = %ticket.id,
                    "No materials consumed for completed ticket: {}",
                    failure
                );
                (Vec::new(), failure.errors)
            }
            Err(e) => {
                tracing::warn!(ticket_id = %ticket.id, "Stock consumption failed: {}", e);
                (Vec::new(), vec![e.to_string()])
            }
        };

        Ok(TicketCompletion {
            ticket,
            consumptions,
            warnings,
        })
    }
}
