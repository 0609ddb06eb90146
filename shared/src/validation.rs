//! Validation utilities for stock and production data

use rust_decimal::Decimal;

use crate::models::MovementType;

// ============================================================================
// Stock Item Validations
// ============================================================================

/// Validate SKU format: 1-64 characters of letters, digits, `-` or `_`
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.is_empty() || sku.len() > 64 {
        return Err("SKU must be between 1 and 64 characters");
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("SKU may only contain letters, digits, '-' and '_'");
    }
    Ok(())
}

/// Area-based materials need a positive length and width per unit
pub fn validate_area_dimensions(
    is_area_based: bool,
    length: Option<Decimal>,
    width: Option<Decimal>,
) -> Result<(), &'static str> {
    if !is_area_based {
        return Ok(());
    }
    match (length, width) {
        (Some(l), Some(w)) if l > Decimal::ZERO && w > Decimal::ZERO => Ok(()),
        (Some(_), Some(_)) => Err("Length and width must be positive"),
        _ => Err("Area-based items require both length and width"),
    }
}

/// Costs and stock levels cannot be negative
pub fn validate_non_negative(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Value cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Movement Validations
// ============================================================================

/// A manual movement must change something
pub fn validate_movement_quantity(
    movement_type: MovementType,
    quantity: Decimal,
) -> Result<(), &'static str> {
    if quantity.is_zero() {
        return Err("Quantity cannot be zero");
    }
    validate_quantity_bounds(quantity)?;
    if movement_type != MovementType::Adjustment && quantity < Decimal::ZERO {
        return Err("Quantity must be positive for stock in and out");
    }
    Ok(())
}

/// Largest magnitude a NUMERIC(14,4) quantity column can hold
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 4);

/// Quantities must fit the stored NUMERIC(14,4) columns
pub fn validate_quantity_bounds(quantity: Decimal) -> Result<(), &'static str> {
    if quantity.abs() > MAX_QUANTITY {
        return Err("Quantity exceeds 9999999999.9999");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TARP-13OZ_WHITE").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_area_dimensions_required_when_area_based() {
        assert!(validate_area_dimensions(false, None, None).is_ok());
        assert!(validate_area_dimensions(true, Some(Decimal::from(4)), Some(Decimal::from(6))).is_ok());
        assert!(validate_area_dimensions(true, Some(Decimal::from(4)), None).is_err());
        assert!(validate_area_dimensions(true, Some(Decimal::ZERO), Some(Decimal::from(6))).is_err());
    }

    #[test]
    fn test_movement_quantity() {
        assert!(validate_movement_quantity(MovementType::In, Decimal::from(5)).is_ok());
        assert!(validate_movement_quantity(MovementType::Adjustment, Decimal::from(-5)).is_ok());
        assert!(validate_movement_quantity(MovementType::Out, Decimal::from(-5)).is_err());
        assert!(validate_movement_quantity(MovementType::Adjustment, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_non_negative() {
        assert!(validate_non_negative(Decimal::ZERO).is_ok());
        assert!(validate_non_negative(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(MAX_QUANTITY, Decimal::new(99_999_999_999_999, 4));
        assert!(validate_quantity_bounds(MAX_QUANTITY).is_ok());
        assert!(validate_quantity_bounds(-MAX_QUANTITY).is_ok());
        assert!(validate_quantity_bounds(MAX_QUANTITY + Decimal::new(1, 4)).is_err());
        assert!(validate_movement_quantity(MovementType::In, Decimal::MAX).is_err());
        assert!(validate_movement_quantity(MovementType::Adjustment, Decimal::MIN).is_err());
    }
}
