//! Purchase order models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purchase order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Pending,
    Approved,
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "draft",
            PurchaseOrderStatus::Pending => "pending",
            PurchaseOrderStatus::Approved => "approved",
            PurchaseOrderStatus::Ordered => "ordered",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PurchaseOrderStatus::Draft),
            "pending" => Some(PurchaseOrderStatus::Pending),
            "approved" => Some(PurchaseOrderStatus::Approved),
            "ordered" => Some(PurchaseOrderStatus::Ordered),
            "received" => Some(PurchaseOrderStatus::Received),
            "cancelled" => Some(PurchaseOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Received | PurchaseOrderStatus::Cancelled
        )
    }

    /// Manual status changes. `Received` is only reached by receiving goods.
    pub fn can_transition_to(&self, next: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;

        match (self, next) {
            (Draft, Pending) | (Pending, Approved) | (Approved, Ordered) => true,
            (current, Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Goods may be booked in once the order has left the draft stage
    pub fn accepts_receipts(&self) -> bool {
        !matches!(
            self,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Cancelled
        )
    }
}

impl std::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchase order header with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_number: String,
    pub supplier_name: Option<String>,
    pub status: PurchaseOrderStatus,
    pub items: Vec<PurchaseOrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ordered material on a purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub stock_item_id: Uuid,
    pub stock_item_name: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    /// Only ever increases, never exceeds `quantity`
    pub received_quantity: Decimal,
}

impl PurchaseOrderItem {
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.received_quantity
    }

    pub fn is_fully_received(&self) -> bool {
        self.received_quantity == self.quantity
    }
}

/// Quantity received against one purchase order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiveItem {
    pub item_id: Uuid,
    pub received_quantity: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PurchaseOrderStatus::Ordered).unwrap();
        assert_eq!(json, "\"ordered\"");
        assert_eq!(
            PurchaseOrderStatus::from_str("cancelled"),
            Some(PurchaseOrderStatus::Cancelled)
        );
    }

    #[test]
    fn test_manual_transitions() {
        use PurchaseOrderStatus::*;

        assert!(Draft.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Ordered));
        assert!(Ordered.can_transition_to(Cancelled));
        assert!(!Ordered.can_transition_to(Received));
        assert!(!Draft.can_transition_to(Ordered));
        assert!(!Received.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_remaining_quantity() {
        let item = PurchaseOrderItem {
            id: Uuid::new_v4(),
            purchase_order_id: Uuid::new_v4(),
            stock_item_id: Uuid::new_v4(),
            stock_item_name: "Eco-solvent Ink Cyan".to_string(),
            quantity: Decimal::from(12),
            unit_cost: Decimal::from(950),
            received_quantity: Decimal::from(5),
        };
        assert_eq!(item.remaining_quantity(), Decimal::from(7));
        assert!(!item.is_fully_received());
    }
}
