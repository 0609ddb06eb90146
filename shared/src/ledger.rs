//! Stock level arithmetic for ledger movements
//!
//! Every stock change goes through [`apply_movement`], which yields the
//! before/after snapshot, the costing and the effective quantity to record.
//! Stock never goes below zero: `out` and `adjustment` movements that would
//! overdraw are clipped at zero rather than rejected.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::MovementType;

/// Decimal places kept for quantities and costs (matches `NUMERIC(14,4)`)
pub const QUANTITY_SCALE: u32 = 4;

/// Round to the stored scale the way Postgres rounds `NUMERIC` (half away from zero)
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// A requested change to one stock item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRequest {
    pub movement_type: MovementType,
    /// Signed for adjustments; the magnitude is used for `in` and `out`
    pub quantity: Decimal,
    /// Replaces the item's current unit cost for this movement
    pub unit_cost: Option<Decimal>,
}

/// Result of applying a movement to a stock level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementOutcome {
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    /// Quantity actually applied; differs from the request when clipped
    pub quantity: Decimal,
    pub requested_quantity: Decimal,
    /// Cost per unit the movement is valued at
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    /// Item unit cost after the movement (re-averaged on priced stock-in)
    pub new_unit_cost: Decimal,
    /// The zero floor absorbed part of the request
    pub clipped: bool,
}

/// Apply a movement to `stock_before` valued at `current_unit_cost`
pub fn apply_movement(
    stock_before: Decimal,
    current_unit_cost: Decimal,
    request: &MovementRequest,
) -> MovementOutcome {
    let requested = round_quantity(request.quantity);
    let magnitude = requested.abs();

    let (stock_after, quantity) = match request.movement_type {
        MovementType::In => (stock_before.saturating_add(magnitude), magnitude),
        MovementType::Out => {
            let after = stock_before.saturating_sub(magnitude).max(Decimal::ZERO);
            (after, stock_before - after)
        }
        MovementType::Adjustment => {
            let after = stock_before.saturating_add(requested).max(Decimal::ZERO);
            (after, after - stock_before)
        }
    };

    let unit_cost = request.unit_cost.unwrap_or(current_unit_cost);
    let total_cost = round_quantity(unit_cost.saturating_mul(quantity.abs()));

    let new_unit_cost = match (request.movement_type, request.unit_cost) {
        (MovementType::In, Some(new_cost)) => {
            weighted_average_cost(stock_before, current_unit_cost, magnitude, new_cost)
        }
        _ => current_unit_cost,
    };

    MovementOutcome {
        stock_before,
        stock_after,
        quantity,
        requested_quantity: requested,
        unit_cost,
        total_cost,
        new_unit_cost,
        clipped: quantity.abs() < magnitude,
    }
}

/// Blend the existing valuation with newly received stock.
///
/// `(stock_before * old_cost + quantity_in * new_cost) / stock_after`, or
/// `new_cost` when the resulting stock is zero or the blend overflows.
pub fn weighted_average_cost(
    stock_before: Decimal,
    old_cost: Decimal,
    quantity_in: Decimal,
    new_cost: Decimal,
) -> Decimal {
    let blended = stock_before
        .checked_add(quantity_in)
        .filter(|after| !after.is_zero())
        .and_then(|after| {
            let held = stock_before.checked_mul(old_cost)?;
            let incoming = quantity_in.checked_mul(new_cost)?;
            held.checked_add(incoming)?.checked_div(after)
        });

    blended.map(round_quantity).unwrap_or(new_cost)
}

/// Stock level reproduced by replaying recorded movements from zero
pub fn replay_movements<I>(movements: I) -> Decimal
where
    I: IntoIterator<Item = (MovementType, Decimal)>,
{
    movements
        .into_iter()
        .fold(Decimal::ZERO, |level, (movement_type, quantity)| {
            level.saturating_add(movement_type.signed_quantity(quantity))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(movement_type: MovementType, quantity: i64) -> MovementRequest {
        MovementRequest {
            movement_type,
            quantity: Decimal::from(quantity),
            unit_cost: None,
        }
    }

    #[test]
    fn test_stock_in_adds_magnitude() {
        let outcome = apply_movement(Decimal::from(5), Decimal::ONE, &request(MovementType::In, -3));
        assert_eq!(outcome.stock_after, Decimal::from(8));
        assert_eq!(outcome.quantity, Decimal::from(3));
        assert!(!outcome.clipped);
    }

    #[test]
    fn test_stock_out_clipped_at_zero() {
        let outcome = apply_movement(Decimal::from(4), Decimal::from(2), &request(MovementType::Out, 10));
        assert_eq!(outcome.stock_after, Decimal::ZERO);
        assert_eq!(outcome.quantity, Decimal::from(4));
        assert_eq!(outcome.total_cost, Decimal::from(8));
        assert!(outcome.clipped);
    }

    #[test]
    fn test_negative_adjustment_keeps_sign() {
        let outcome = apply_movement(Decimal::from(10), Decimal::ONE, &request(MovementType::Adjustment, -4));
        assert_eq!(outcome.stock_after, Decimal::from(6));
        assert_eq!(outcome.quantity, Decimal::from(-4));
        assert_eq!(outcome.total_cost, Decimal::from(4));
    }

    #[test]
    fn test_weighted_average_on_priced_stock_in() {
        let outcome = apply_movement(
            Decimal::from(10),
            Decimal::from(5),
            &MovementRequest {
                movement_type: MovementType::In,
                quantity: Decimal::from(10),
                unit_cost: Some(Decimal::from(7)),
            },
        );
        assert_eq!(outcome.new_unit_cost, Decimal::from(6));
        assert_eq!(outcome.total_cost, Decimal::from(70));
    }

    #[test]
    fn test_cost_override_on_out_does_not_reaverage() {
        let outcome = apply_movement(
            Decimal::from(10),
            Decimal::from(5),
            &MovementRequest {
                movement_type: MovementType::Out,
                quantity: Decimal::from(2),
                unit_cost: Some(Decimal::from(9)),
            },
        );
        assert_eq!(outcome.new_unit_cost, Decimal::from(5));
        assert_eq!(outcome.total_cost, Decimal::from(18));
    }

    #[test]
    fn test_weighted_average_zero_stock_uses_new_cost() {
        let cost = weighted_average_cost(Decimal::ZERO, Decimal::from(3), Decimal::ZERO, Decimal::from(11));
        assert_eq!(cost, Decimal::from(11));
    }

    #[test]
    fn test_replay_signs_by_type() {
        let level = replay_movements([
            (MovementType::In, Decimal::from(20)),
            (MovementType::Out, Decimal::from(5)),
            (MovementType::Adjustment, Decimal::from(-3)),
            (MovementType::Adjustment, Decimal::from(1)),
        ]);
        assert_eq!(level, Decimal::from(13));
    }

    #[test]
    fn test_quantities_round_half_away_from_zero() {
        assert_eq!(round_quantity(Decimal::new(5, 5)), Decimal::new(1, 4));
        assert_eq!(round_quantity(Decimal::new(-5, 5)), Decimal::new(-1, 4));
        assert_eq!(round_quantity(Decimal::new(999995, 5)), Decimal::from(10));

        let outcome = apply_movement(
            Decimal::ZERO,
            Decimal::ONE,
            &MovementRequest {
                movement_type: MovementType::In,
                quantity: Decimal::new(5, 5),
                unit_cost: None,
            },
        );
        assert_eq!(outcome.quantity, Decimal::new(1, 4));
        assert_eq!(outcome.stock_after, Decimal::new(1, 4));
    }

    #[test]
    fn test_extreme_quantities_do_not_overflow() {
        let huge = MovementRequest {
            movement_type: MovementType::In,
            quantity: Decimal::MAX,
            unit_cost: Some(Decimal::from(3)),
        };
        let outcome = apply_movement(Decimal::from(5), Decimal::ONE, &huge);
        assert_eq!(outcome.stock_after, Decimal::MAX);
        assert_eq!(outcome.new_unit_cost, Decimal::from(3));

        let drain = MovementRequest {
            movement_type: MovementType::Adjustment,
            quantity: Decimal::MIN,
            unit_cost: None,
        };
        let outcome = apply_movement(Decimal::from(5), Decimal::ONE, &drain);
        assert_eq!(outcome.stock_after, Decimal::ZERO);
        assert!(outcome.clipped);
    }
}
