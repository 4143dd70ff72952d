//! # Validation Module
//!
//! Boundary checks run before any pricing math.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Order / quotation form (TypeScript)                          │
//! │  ├── min/max hints on inputs                                           │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field-addressed errors (items[2].quantity)                        │
//! │  └── Runs in the browser AND again on submission                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: PriceCalculator                                              │
//! │  └── Assumes validated input, fails only on overflow                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here coerces a bad value to zero: a negative price is a data-entry
//! mistake the user must see. Clamping a discount to the subtotal is the one
//! intentional adjustment and it happens in the calculator, not here.
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use storefront_core::validation::{validate_unit_price, validate_promo_code};
//!
//! assert!(validate_unit_price(0, Decimal::new(1099, 2)).is_ok());
//! assert!(validate_unit_price(0, Decimal::new(-1, 0)).is_err());
//! assert_eq!(validate_promo_code(" summer-10 ").unwrap(), "SUMMER-10");
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::pricing::{PercentageOverflow, PricingPolicy};
use crate::types::{DiscountKind, DiscountSpec, LineItem, LineSource};
use crate::{MAX_PRICE_SCALE, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const PROMO_CODE_MIN_LEN: usize = 3;
const PROMO_CODE_MAX_LEN: usize = 32;
const CUSTOM_LINE_NAME_MAX_LEN: usize = 200;

fn item_field(index: usize, name: &str) -> String {
    format!("items[{}].{}", index, name)
}

// =============================================================================
// Line Validators
// =============================================================================

/// Validates the quantity of line `index`.
///
/// ## Rules
/// - Must not be negative
/// - Zero is allowed (the row is pending removal and prices as nothing)
/// - Must not exceed `max`
pub fn validate_line_quantity(index: usize, qty: i64, max: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: item_field(index, "quantity"),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: item_field(index, "quantity"),
            min: 0,
            max,
        });
    }

    Ok(())
}

/// Validates the unit price of line `index`.
pub fn validate_unit_price(index: usize, price: Decimal) -> ValidationResult<()> {
    validate_price(&item_field(index, "unitPrice"), price)
}

/// Validates a unit price wherever it comes from: a form line or a catalog.
///
/// ## Rules
/// - Must be non-negative (zero is a free item)
/// - Must not exceed `MAX_UNIT_PRICE`
/// - At most `MAX_PRICE_SCALE` decimal places (trailing zeros don't count)
pub fn validate_price(field: &str, price: Decimal) -> ValidationResult<()> {
    if price < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if price > Decimal::from(MAX_UNIT_PRICE) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_UNIT_PRICE,
        });
    }

    if price.normalize().scale() > MAX_PRICE_SCALE {
        return Err(ValidationError::TooPrecise {
            field: field.to_string(),
            max: MAX_PRICE_SCALE,
        });
    }

    Ok(())
}

/// Validates the display name of a custom line.
pub fn validate_custom_line_name(index: usize, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: item_field(index, "source.name"),
        });
    }

    if name.chars().count() > CUSTOM_LINE_NAME_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: item_field(index, "source.name"),
            max: CUSTOM_LINE_NAME_MAX_LEN,
        });
    }

    Ok(())
}

/// Validates every line and the number of lines.
pub fn validate_line_items(items: &[LineItem], policy: &PricingPolicy) -> ValidationResult<()> {
    if items.len() > policy.max_line_items {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 0,
            max: policy.max_line_items as i64,
        });
    }

    for (index, item) in items.iter().enumerate() {
        validate_line_quantity(index, item.quantity, policy.max_item_quantity)?;
        validate_unit_price(index, item.unit_price)?;

        if let Some(LineSource::Custom { name }) = &item.source {
            validate_custom_line_name(index, name)?;
        }
    }

    Ok(())
}

// =============================================================================
// Rate and Discount Validators
// =============================================================================

/// Validates a tax rate fraction.
///
/// ## Rules
/// - Must be within `[0, 1]` (0% to 100%)
pub fn validate_tax_rate(fraction: Decimal) -> ValidationResult<()> {
    if fraction < Decimal::ZERO || fraction > Decimal::ONE {
        return Err(ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0,
            max: 1,
        });
    }

    Ok(())
}

/// Validates a discount specification.
///
/// ## Rules
/// - `value` and `maximumAmount` must not be negative
/// - `value` at most `MAX_PRICE_SCALE` decimal places
/// - A percentage above 100 is rejected only under `PercentageOverflow::Reject`
///
/// ## User Workflow
/// ```text
/// Admin types 120 into "Discount %"
///      │
///      ▼
/// validate_discount ← THIS FUNCTION
///      │
///      ├── policy Reject → Error: "discount.value must be between 0 and 100"
///      │
///      └── policy Clamp  → OK, calculator treats it as 100%
/// ```
pub fn validate_discount(
    discount: &DiscountSpec,
    overflow: PercentageOverflow,
) -> ValidationResult<()> {
    if discount.value < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: "discount.value".to_string(),
        });
    }

    if discount.value.normalize().scale() > MAX_PRICE_SCALE {
        return Err(ValidationError::TooPrecise {
            field: "discount.value".to_string(),
            max: MAX_PRICE_SCALE,
        });
    }

    if let Some(cap) = discount.maximum_amount {
        if cap < Decimal::ZERO {
            return Err(ValidationError::Negative {
                field: "discount.maximumAmount".to_string(),
            });
        }
    }

    if discount.kind == DiscountKind::Percentage
        && discount.value > Decimal::ONE_HUNDRED
        && overflow == PercentageOverflow::Reject
    {
        return Err(ValidationError::OutOfRange {
            field: "discount.value".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates and normalizes a promo code.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - 3 to 32 characters
/// - Letters, digits, hyphens, underscores only
///
/// ## Returns
/// The code, trimmed and upper-cased.
pub fn validate_promo_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "promoCode".to_string(),
        });
    }

    if code.len() < PROMO_CODE_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "promoCode".to_string(),
            min: PROMO_CODE_MIN_LEN,
        });
    }

    if code.len() > PROMO_CODE_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "promoCode".to_string(),
            max: PROMO_CODE_MAX_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "promoCode".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================
