//! Purchase order receiving reconciliation
//!
//! A receipt is checked against every line's outstanding quantity before
//! anything is written; one bad entry rejects the whole receipt.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::round_quantity;
use crate::models::{PurchaseOrderItem, PurchaseOrderStatus, ReceiveItem};

/// Reasons a receipt is rejected
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReceivingError {
    #[error("Purchase order item {0} does not belong to this order")]
    UnknownItem(Uuid),

    #[error("Received quantity for {item_name} cannot be negative")]
    NegativeQuantity { item_name: String },

    #[error("Cannot receive {requested} of {item_name}: only {available} remaining")]
    ExceedsRemaining {
        item_name: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Purchase order in status {0} cannot receive goods")]
    OrderNotReceivable(PurchaseOrderStatus),
}

/// One line of an accepted receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub item_id: Uuid,
    pub stock_item_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    /// Line's `received_quantity` after this receipt
    pub received_quantity: Decimal,
}

/// Writes required to book a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptPlan {
    pub lines: Vec<ReceiptLine>,
    pub status: PurchaseOrderStatus,
}

/// Validate `received` against `items` and compute the resulting state.
///
/// Quantities are rounded to the stored scale before any comparison. Zero
/// quantities are accepted and produce no line. Repeated entries for the
/// same line accumulate against its remaining quantity.
pub fn plan_receipt(
    status: PurchaseOrderStatus,
    items: &[PurchaseOrderItem],
    received: &[ReceiveItem],
) -> Result<ReceiptPlan, ReceivingError> {
    if !status.accepts_receipts() {
        return Err(ReceivingError::OrderNotReceivable(status));
    }

    let by_id: HashMap<Uuid, &PurchaseOrderItem> = items.iter().map(|i| (i.id, i)).collect();
    let mut received_so_far: HashMap<Uuid, Decimal> =
        items.iter().map(|i| (i.id, i.received_quantity)).collect();
    let mut lines = Vec::new();

    for entry in received {
        let item = by_id
            .get(&entry.item_id)
            .ok_or(ReceivingError::UnknownItem(entry.item_id))?;

        if entry.received_quantity < Decimal::ZERO {
            return Err(ReceivingError::NegativeQuantity {
                item_name: item.stock_item_name.clone(),
            });
        }
        let quantity = round_quantity(entry.received_quantity);
        if quantity.is_zero() {
            continue;
        }

        let so_far = received_so_far.entry(item.id).or_insert(item.received_quantity);
        let available = item.quantity - *so_far;
        if quantity > available {
            return Err(ReceivingError::ExceedsRemaining {
                item_name: item.stock_item_name.clone(),
                requested: quantity,
                available,
            });
        }

        *so_far += quantity;
        lines.push(ReceiptLine {
            item_id: item.id,
            stock_item_id: item.stock_item_id,
            quantity,
            unit_cost: item.unit_cost,
            received_quantity: *so_far,
        });
    }

    let after: Vec<PurchaseOrderItem> = items
        .iter()
        .map(|i| PurchaseOrderItem {
            received_quantity: received_so_far
                .get(&i.id)
                .copied()
                .unwrap_or(i.received_quantity),
            ..i.clone()
        })
        .collect();

    Ok(ReceiptPlan {
        lines,
        status: order_status_after_receipt(&after),
    })
}

/// `Received` once every line is fully received, `Ordered` otherwise
pub fn order_status_after_receipt(items: &[PurchaseOrderItem]) -> PurchaseOrderStatus {
    if items.iter().all(PurchaseOrderItem::is_fully_received) {
        PurchaseOrderStatus::Received
    } else {
        PurchaseOrderStatus::Ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, received: i64) -> PurchaseOrderItem {
        PurchaseOrderItem {
            id: Uuid::new_v4(),
            purchase_order_id: Uuid::nil(),
            stock_item_id: Uuid::new_v4(),
            stock_item_name: "Vinyl Sticker Roll".to_string(),
            quantity: Decimal::from(quantity),
            unit_cost: Decimal::from(12),
            received_quantity: Decimal::from(received),
        }
    }

    #[test]
    fn test_repeated_entries_accumulate() {
        let item = line(10, 2);
        let receipt = vec![
            ReceiveItem { item_id: item.id, received_quantity: Decimal::from(5) },
            ReceiveItem { item_id: item.id, received_quantity: Decimal::from(4) },
        ];

        let err = plan_receipt(PurchaseOrderStatus::Ordered, &[item], &receipt).unwrap_err();
        assert_eq!(
            err,
            ReceivingError::ExceedsRemaining {
                item_name: "Vinyl Sticker Roll".to_string(),
                requested: Decimal::from(4),
                available: Decimal::from(3),
            }
        );
    }

    #[test]
    fn test_zero_quantity_writes_nothing() {
        let item = line(10, 0);
        let receipt = vec![ReceiveItem { item_id: item.id, received_quantity: Decimal::ZERO }];

        let plan = plan_receipt(PurchaseOrderStatus::Approved, &[item], &receipt).unwrap();
        assert!(plan.lines.is_empty());
        assert_eq!(plan.status, PurchaseOrderStatus::Ordered);
    }

    #[test]
    fn test_cancelled_order_rejected() {
        let item = line(10, 0);
        let receipt = vec![ReceiveItem { item_id: item.id, received_quantity: Decimal::ONE }];

        assert_eq!(
            plan_receipt(PurchaseOrderStatus::Cancelled, &[item], &receipt),
            Err(ReceivingError::OrderNotReceivable(PurchaseOrderStatus::Cancelled))
        );
    }

    #[test]
    fn test_error_message_names_item_and_quantities() {
        let err = ReceivingError::ExceedsRemaining {
            item_name: "A3 Gloss Paper".to_string(),
            requested: Decimal::from(7),
            available: Decimal::from(5),
        };
        assert_eq!(err.to_string(), "Cannot receive 7 of A3 Gloss Paper: only 5 remaining");
    }

    #[test]
    fn test_sub_scale_quantities_rounded_before_checks() {
        let item = line(10, 0);
        let receipt = vec![ReceiveItem {
            item_id: item.id,
            received_quantity: Decimal::new(999995, 5),
        }];

        let plan = plan_receipt(PurchaseOrderStatus::Ordered, &[item], &receipt).unwrap();
        assert_eq!(plan.lines[0].quantity, Decimal::from(10));
        assert_eq!(plan.lines[0].received_quantity, Decimal::from(10));
        assert_eq!(plan.status, PurchaseOrderStatus::Received);
    }

    #[test]
    fn test_half_step_rounds_like_the_database() {
        let item = line(10, 0);
        let receipt = vec![ReceiveItem {
            item_id: item.id,
            received_quantity: Decimal::new(5, 5),
        }];

        let plan = plan_receipt(PurchaseOrderStatus::Ordered, &[item], &receipt).unwrap();
        assert_eq!(plan.lines[0].quantity, Decimal::new(1, 4));
        assert_eq!(plan.lines[0].received_quantity, Decimal::new(1, 4));
    }

    #[test]
    fn test_quantity_below_scale_writes_nothing() {
        let item = line(10, 0);
        let receipt = vec![ReceiveItem {
            item_id: item.id,
            received_quantity: Decimal::new(4, 5),
        }];

        let plan = plan_receipt(PurchaseOrderStatus::Ordered, &[item], &receipt).unwrap();
        assert!(plan.lines.is_empty());
        assert_eq!(plan.status, PurchaseOrderStatus::Ordered);
    }
}
