//! Purchase order receiving tests
//!
//! Tests for goods receipt including:
//! - Receipts never exceed the ordered quantity
//! - A rejected receipt plans no writes
//! - Order status derives from line completion

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{PurchaseOrderItem, PurchaseOrderStatus, ReceiveItem};
use shared::receiving::{order_status_after_receipt, plan_receipt, ReceivingError};

fn po_line(name: &str, quantity: i64, received: i64) -> PurchaseOrderItem {
    PurchaseOrderItem {
        id: Uuid::new_v4(),
        purchase_order_id: Uuid::nil(),
        stock_item_id: Uuid::new_v4(),
        stock_item_name: name.to_string(),
        quantity: Decimal::from(quantity),
        unit_cost: Decimal::new(1250, 2),
        received_quantity: Decimal::from(received),
    }
}

fn receive(item: &PurchaseOrderItem, quantity: i64) -> ReceiveItem {
    ReceiveItem {
        item_id: item.id,
        received_quantity: Decimal::from(quantity),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_full_receipt_marks_order_received() {
        let paper = po_line("A4 Bond Paper", 20, 5);
        let ink = po_line("Cyan Ink", 4, 0);
        let receipt = vec![receive(&paper, 15), receive(&ink, 4)];

        let plan = plan_receipt(PurchaseOrderStatus::Ordered, &[paper.clone(), ink.clone()], &receipt)
            .unwrap();

        assert_eq!(plan.status, PurchaseOrderStatus::Received);
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].stock_item_id, paper.stock_item_id);
        assert_eq!(plan.lines[0].received_quantity, Decimal::from(20));
        assert_eq!(plan.lines[0].unit_cost, Decimal::new(1250, 2));
        assert_eq!(plan.lines[1].quantity, Decimal::from(4));
    }

    #[test]
    fn test_partial_receipt_keeps_order_open() {
        let paper = po_line("A4 Bond Paper", 20, 0);
        let receipt = vec![receive(&paper, 12)];

        let plan = plan_receipt(PurchaseOrderStatus::Approved, &[paper], &receipt).unwrap();

        assert_eq!(plan.status, PurchaseOrderStatus::Ordered);
        assert_eq!(plan.lines[0].received_quantity, Decimal::from(12));
    }

    #[test]
    fn test_over_receipt_rejected_with_remaining() {
        let tarp = po_line("Tarpaulin 4x6", 10, 8);
        let receipt = vec![receive(&tarp, 3)];

        let err = plan_receipt(PurchaseOrderStatus::Ordered, &[tarp], &receipt).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Cannot receive 3 of Tarpaulin 4x6: only 2 remaining"
        );
    }

    #[test]
    fn test_one_bad_entry_rejects_whole_receipt() {
        let paper = po_line("A4 Bond Paper", 20, 0);
        let ink = po_line("Cyan Ink", 4, 4);
        let receipt = vec![receive(&paper, 10), receive(&ink, 1)];

        let result = plan_receipt(PurchaseOrderStatus::Ordered, &[paper, ink], &receipt);

        assert!(matches!(result, Err(ReceivingError::ExceedsRemaining { .. })));
    }

    #[test]
    fn test_unknown_line_rejected() {
        let paper = po_line("A4 Bond Paper", 20, 0);
        let stranger = Uuid::new_v4();
        let receipt = vec![ReceiveItem { item_id: stranger, received_quantity: Decimal::ONE }];

        assert_eq!(
            plan_receipt(PurchaseOrderStatus::Ordered, &[paper], &receipt),
            Err(ReceivingError::UnknownItem(stranger))
        );
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let paper = po_line("A4 Bond Paper", 20, 0);
        let receipt = vec![receive(&paper, -1)];

        assert!(matches!(
            plan_receipt(PurchaseOrderStatus::Ordered, &[paper], &receipt),
            Err(ReceivingError::NegativeQuantity { .. })
        ));
    }

    #[test]
    fn test_draft_order_cannot_receive() {
        let paper = po_line("A4 Bond Paper", 20, 0);
        let receipt = vec![receive(&paper, 1)];

        assert_eq!(
            plan_receipt(PurchaseOrderStatus::Draft, &[paper], &receipt),
            Err(ReceivingError::OrderNotReceivable(PurchaseOrderStatus::Draft))
        );
    }

    #[test]
    fn test_order_without_lines_is_received() {
        assert_eq!(
            order_status_after_receipt(&[]),
            PurchaseOrderStatus::Received
        );
    }

    /// The line update and the stock movement see the same stored quantity
    #[test]
    fn test_receipt_rounds_to_stored_scale() {
        let vinyl = po_line("Vinyl Roll", 10, 0);
        let receipt = vec![ReceiveItem {
            item_id: vinyl.id,
            received_quantity: Decimal::new(999_995, 5),
        }];

        let plan = plan_receipt(PurchaseOrderStatus::Ordered, &[vinyl.clone()], &receipt).unwrap();

        assert_eq!(plan.lines[0].quantity, Decimal::from(10));
        assert_eq!(plan.lines[0].received_quantity, Decimal::from(10));
        assert_eq!(plan.status, PurchaseOrderStatus::Received);
    }

    #[test]
    fn test_oversized_receipt_rejected_not_panicking() {
        let vinyl = po_line("Vinyl Roll", 10, 0);
        let receipt = vec![ReceiveItem {
            item_id: vinyl.id,
            received_quantity: Decimal::MAX,
        }];

        let err = plan_receipt(PurchaseOrderStatus::Ordered, &[vinyl], &receipt).unwrap_err();

        assert!(matches!(err, ReceivingError::ExceedsRemaining { .. }));
    }

    #[test]
    fn test_status_transitions() {
        assert!(PurchaseOrderStatus::Draft.can_transition_to(PurchaseOrderStatus::Pending));
        assert!(PurchaseOrderStatus::Approved.can_transition_to(PurchaseOrderStatus::Ordered));
        assert!(PurchaseOrderStatus::Ordered.can_transition_to(PurchaseOrderStatus::Cancelled));
        assert!(!PurchaseOrderStatus::Received.can_transition_to(PurchaseOrderStatus::Cancelled));
        assert!(!PurchaseOrderStatus::Draft.can_transition_to(PurchaseOrderStatus::Ordered));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Ordered quantity with an already-received share
    fn line_strategy() -> impl Strategy<Value = (i64, i64)> {
        (1i64..=500i64).prop_flat_map(|quantity| (Just(quantity), 0..=quantity))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Accepted receipts never push a line past its ordered quantity
        #[test]
        fn prop_received_never_exceeds_ordered(
            lines in prop::collection::vec(line_strategy(), 1..8),
            requested in prop::collection::vec(0i64..=600i64, 1..8),
        ) {
            let items: Vec<PurchaseOrderItem> = lines
                .iter()
                .map(|(q, r)| po_line("Material", *q, *r))
                .collect();
            let receipt: Vec<ReceiveItem> = items
                .iter()
                .zip(requested.iter())
                .map(|(item, q)| receive(item, *q))
                .collect();

            let fits = items
                .iter()
                .zip(requested.iter())
                .all(|(item, q)| Decimal::from(*q) <= item.remaining_quantity());

            match plan_receipt(PurchaseOrderStatus::Ordered, &items, &receipt) {
                Ok(plan) => {
                    prop_assert!(fits);
                    for line in &plan.lines {
                        let item = items.iter().find(|i| i.id == line.item_id).unwrap();
                        prop_assert!(line.received_quantity <= item.quantity);
                    }
                }
                Err(err) => {
                    prop_assert!(!fits);
                    let is_exceeds = matches!(err, ReceivingError::ExceedsRemaining { .. });
                    prop_assert!(is_exceeds);
                }
            }
        }

        /// Received iff every line is fully received
        #[test]
        fn prop_received_iff_all_lines_complete(
            lines in prop::collection::vec(line_strategy(), 0..10)
        ) {
            let all_complete = lines.iter().all(|(q, r)| q == r);
            let items: Vec<PurchaseOrderItem> = lines
                .iter()
                .map(|(q, r)| po_line("Material", *q, *r))
                .collect();
            let status = order_status_after_receipt(&items);

            prop_assert_eq!(status == PurchaseOrderStatus::Received, all_complete);
        }
    }
}
