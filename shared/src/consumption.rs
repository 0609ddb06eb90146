//! Material consumption for completed production tickets
//!
//! Planning is pure: given the ticket, its job type's requirements, the
//! locked stock items and the materials already consumed for the ticket, it
//! decides what to issue and which materials to skip. Skips caused by
//! missing, inactive or short materials are soft errors; the event only
//! fails when nothing at all could be issued.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::round_quantity;
use crate::models::{JobTypeStockRequirement, StockItem, Ticket};

/// `<number> x <number>`, case-insensitive, optional whitespace
static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*x\s*(\d+(?:\.\d+)?)").expect("size pattern is valid")
});

/// Production length and width parsed from a ticket's size text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionDimensions {
    pub length: Decimal,
    pub width: Decimal,
}

impl ProductionDimensions {
    /// Parse sizes such as `"100x50"`, `"3 X 2"` or `"2.5x4 ft"`.
    ///
    /// Returns `None` when the text holds no size or a size whose area is
    /// not representable; never fails.
    pub fn parse(size_value: &str) -> Option<Self> {
        let caps = SIZE_PATTERN.captures(size_value)?;
        let length = Decimal::from_str(caps.get(1)?.as_str()).ok()?;
        let width = Decimal::from_str(caps.get(2)?.as_str()).ok()?;
        let dims = Self { length, width };
        dims.area().map(|_| dims)
    }

    /// `None` on overflow
    pub fn area(&self) -> Option<Decimal> {
        self.length.checked_mul(self.width)
    }
}

/// Per-unit rate used when a requirement is inferred from a stock item's
/// job type link: area-based materials are sized from the ticket instead.
pub fn default_quantity_per_unit(item: &StockItem) -> Decimal {
    if item.is_area_based {
        Decimal::ZERO
    } else {
        Decimal::ONE
    }
}

/// Quantity of a material a ticket needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequiredQuantity {
    /// In stock units; fractional rolls and sheets are allowed
    pub quantity: Decimal,
    /// Production area, for area-based materials whose area is known
    pub area_consumed: Option<Decimal>,
}

/// Compute how much of `item` a ticket of `ticket_quantity` units needs
pub fn required_quantity(
    item: &StockItem,
    quantity_per_unit: Decimal,
    ticket_quantity: i32,
    dimensions: Option<ProductionDimensions>,
) -> RequiredQuantity {
    let units = Decimal::from(ticket_quantity);

    if item.is_area_based {
        // An area too large to compute is treated like an unparsed size
        let sized = dimensions
            .and_then(|dims| dims.area())
            .and_then(|area| area.checked_mul(units))
            .zip(item.unit_area().filter(|area| !area.is_zero()))
            .and_then(|(area_consumed, unit_area)| {
                let quantity = area_consumed.checked_div(unit_area)?;
                Some((area_consumed, quantity))
            });
        if let Some((area_consumed, quantity)) = sized {
            return RequiredQuantity {
                quantity: round_quantity(quantity),
                area_consumed: Some(area_consumed),
            };
        }

        let quantity = round_quantity(quantity_per_unit.saturating_mul(units));
        return RequiredQuantity {
            quantity,
            area_consumed: item.unit_area().and_then(|area| quantity.checked_mul(area)),
        };
    }

    RequiredQuantity {
        quantity: round_quantity(quantity_per_unit.saturating_mul(units)),
        area_consumed: None,
    }
}

/// Check `required` against `current_stock`, by area when both are known
pub fn check_availability(
    item: &StockItem,
    current_stock: Decimal,
    required: &RequiredQuantity,
) -> Result<(), String> {
    match (item.is_area_based, required.area_consumed, item.unit_area()) {
        (true, Some(area), Some(unit_area)) => {
            // Stock whose area overflows covers any representable requirement
            let Some(available) = current_stock.checked_mul(unit_area) else {
                return Ok(());
            };
            if area > available {
                return Err(format!(
                    "Insufficient stock for {}: required {} sq.ft, available {} sq.ft",
                    item.name,
                    area.normalize(),
                    available.normalize()
                ));
            }
        }
        _ => {
            if required.quantity > current_stock {
                return Err(format!(
                    "Insufficient stock for {}: required {} {}, available {} {}",
                    item.name,
                    required.quantity.normalize(),
                    item.unit,
                    current_stock.normalize(),
                    item.unit
                ));
            }
        }
    }
    Ok(())
}

/// A material the ticket will consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedConsumption {
    pub stock_item_id: Uuid,
    pub stock_item_name: String,
    pub quantity: Decimal,
    pub area_consumed: Option<Decimal>,
    /// Unit cost snapshot at consumption time
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub notes: String,
}

/// Materials to issue plus the soft errors collected while planning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionPlan {
    pub consumptions: Vec<PlannedConsumption>,
    pub errors: Vec<String>,
}

/// Nothing could be consumed and at least one material failed
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Stock consumption failed: {}", .errors.join("; "))]
pub struct ConsumptionFailure {
    pub errors: Vec<String>,
}

/// Decide the fate of a consumption run.
///
/// Any success commits and the errors become warnings; errors without a
/// single success fail the whole run.
pub fn settle_outcome(
    consumed: usize,
    errors: Vec<String>,
) -> Result<Vec<String>, ConsumptionFailure> {
    if consumed == 0 && !errors.is_empty() {
        Err(ConsumptionFailure { errors })
    } else {
        Ok(errors)
    }
}

/// Plan the materials `ticket` consumes.
///
/// `items` holds the (locked) stock items referenced by `requirements`;
/// `already_consumed` the stock item ids this ticket consumed before.
/// Availability is checked against a running stock level, so two
/// requirements on the same material cannot both draw on the same stock.
pub fn plan_consumption(
    ticket: &Ticket,
    requirements: &[JobTypeStockRequirement],
    items: &HashMap<Uuid, StockItem>,
    already_consumed: &HashSet<Uuid>,
) -> ConsumptionPlan {
    let dimensions = ticket
        .size_value
        .as_deref()
        .and_then(ProductionDimensions::parse);

    let mut plan = ConsumptionPlan::default();
    let mut running_stock: HashMap<Uuid, Decimal> = HashMap::new();
    let mut consumed: HashSet<Uuid> = already_consumed.clone();

    for requirement in requirements {
        let Some(item) = items.get(&requirement.stock_item_id) else {
            plan.errors.push(format!(
                "Stock item {} not found for this job type",
                requirement.stock_item_id
            ));
            continue;
        };
        if !item.is_active {
            plan.errors.push(format!("Stock item {} is inactive", item.name));
            continue;
        }

        let required = required_quantity(
            item,
            requirement.quantity_per_unit,
            ticket.quantity,
            dimensions,
        );
        if required.quantity <= Decimal::ZERO {
            continue;
        }

        // Skip issued materials before the availability check, so a re-run
        // after the stock ran out is a silent no-op rather than a shortage
        if consumed.contains(&item.id) {
            continue;
        }

        let current_stock = *running_stock.entry(item.id).or_insert(item.current_stock);
        if let Err(message) = check_availability(item, current_stock, &required) {
            plan.errors.push(message);
            continue;
        }

        running_stock.insert(item.id, current_stock - required.quantity);
        consumed.insert(item.id);

        let mut notes = format!("Auto-consumed for ticket {}", ticket.ticket_number);
        if let Some(area) = required.area_consumed {
            notes.push_str(&format!(" (area consumed: {} sq.ft)", area.normalize()));
        }

        plan.consumptions.push(PlannedConsumption {
            stock_item_id: item.id,
            stock_item_name: item.name.clone(),
            quantity: required.quantity,
            area_consumed: required.area_consumed,
            unit_cost: item.unit_cost,
            total_cost: round_quantity(item.unit_cost.saturating_mul(required.quantity)),
            notes,
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        let dims = ProductionDimensions::parse("100x50").unwrap();
        assert_eq!(dims.length, Decimal::from(100));
        assert_eq!(dims.width, Decimal::from(50));

        let dims = ProductionDimensions::parse("  3 X 2 ft").unwrap();
        assert_eq!(dims.area(), Some(Decimal::from(6)));

        let dims = ProductionDimensions::parse("2.5x4").unwrap();
        assert_eq!(dims.area(), Some(Decimal::from(10)));
    }

    #[test]
    fn test_parse_dimensions_no_match() {
        assert_eq!(ProductionDimensions::parse("A4"), None);
        assert_eq!(ProductionDimensions::parse(""), None);
        assert_eq!(ProductionDimensions::parse("x50"), None);
    }

    #[test]
    fn test_parse_rejects_unrepresentable_area() {
        assert_eq!(
            ProductionDimensions::parse("999999999999999999x999999999999999999"),
            None
        );
        let dims = ProductionDimensions {
            length: Decimal::MAX,
            width: Decimal::from(2),
        };
        assert_eq!(dims.area(), None);
    }

    #[test]
    fn test_settle_outcome() {
        assert_eq!(settle_outcome(0, vec![]), Ok(vec![]));
        assert_eq!(settle_outcome(2, vec!["short".to_string()]), Ok(vec!["short".to_string()]));

        let failure = settle_outcome(0, vec!["a".to_string(), "b".to_string()]).unwrap_err();
        assert_eq!(failure.to_string(), "Stock consumption failed: a; b");
    }
}
