//! Production tickets and material consumption models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Production ticket status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    InProduction,
    Completed,
    Cancelled,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Pending,
        TicketStatus::InProduction,
        TicketStatus::Completed,
        TicketStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::InProduction => "in_production",
            TicketStatus::Completed => "completed",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TicketStatus::Pending),
            "in_production" => Some(TicketStatus::InProduction),
            "completed" => Some(TicketStatus::Completed),
            "cancelled" => Some(TicketStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_complete(&self) -> bool {
        matches!(self, TicketStatus::Pending | TicketStatus::InProduction)
    }

    /// Only finished work draws materials from stock
    pub fn consumes_stock(&self) -> bool {
        matches!(self, TicketStatus::Completed)
    }

    /// Statuses a ticket may be completed from, as stored in the database
    pub fn completable() -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|status| status.can_complete())
            .map(TicketStatus::as_str)
            .collect()
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A production job instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub ticket_number: String,
    pub job_type_id: Option<Uuid>,
    pub quantity: i32,
    /// Free-text production size (e.g. "100x50")
    pub size_value: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Material a job type consumes per produced unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTypeStockRequirement {
    pub id: Uuid,
    pub job_type_id: Uuid,
    pub stock_item_id: Uuid,
    pub quantity_per_unit: Decimal,
    pub is_required: bool,
}

/// Record that a ticket consumed a material; at most one per ticket and item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionStockConsumption {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub stock_item_id: Uuid,
    pub quantity_consumed: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub notes: Option<String>,
    pub consumed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completable_statuses() {
        assert_eq!(TicketStatus::completable(), vec!["pending", "in_production"]);
    }

    #[test]
    fn test_status_round_trip() {
        for status in TicketStatus::ALL {
            assert_eq!(TicketStatus::from_str(status.as_str()), Some(status));
        }
    }
}
