//! Validation utilities for business records
//!
//! These guard the few hard invariants the ledger and recorder carry;
//! everything else is best-effort coerced at the boundary instead of
//! rejected.

use rust_decimal::Decimal;

/// Validate a transaction quantity (purchases and sales must move stock)
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a unit price (zero is allowed, negative is not)
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}

/// Validate a tax rate percentage
pub fn validate_tax_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO || rate > Decimal::from(100) {
        return Err("Tax rate must be between 0 and 100");
    }
    Ok(())
}

/// Clamp a stock level at zero; stock never goes negative
pub fn clamp_non_negative(quantity: Decimal) -> Decimal {
    if quantity < Decimal::ZERO {
        Decimal::ZERO
    } else {
        quantity
    }
}
