//! # Domain Types
//!
//! The inputs of a pricing calculation.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Pricing Inputs                                  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │  DiscountSpec   │   │    TaxRate      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  source?        │   │  type           │   │  fraction       │       │
//! │  │  quantity       │   │  value          │   │  0.11 = 11%     │       │
//! │  │  unit_price     │   │  maximum_amount?│   │  [0, 1]         │       │
//! │  └────────┬────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │                                                             │
//! │  ┌────────▼────────┐                                                    │
//! │  │   LineSource    │   Product | Variant | Custom                      │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::validation::{validate_tax_rate, ValidationResult};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate as a decimal fraction (`0.11` = 11%).
///
/// Always within `[0, 1]`; deserializing an out-of-range value fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a tax rate from a fraction in `[0, 1]`.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use storefront_core::types::TaxRate;
    ///
    /// let rate = TaxRate::from_fraction(Decimal::new(11, 2)).unwrap(); // 11%
    /// assert_eq!(rate.bps(), 1100);
    /// assert!(TaxRate::from_fraction(Decimal::new(11, 1)).is_err()); // 110%
    /// ```
    pub fn from_fraction(fraction: Decimal) -> ValidationResult<Self> {
        validate_tax_rate(fraction)?;
        Ok(TaxRate(fraction.normalize()))
    }

    /// Creates a tax rate from a percentage (`11` = 11%).
    pub fn from_percentage(pct: Decimal) -> ValidationResult<Self> {
        Self::from_fraction(pct / Decimal::ONE_HUNDRED)
    }

    /// Creates a tax rate from basis points (`825` = 8.25%).
    pub fn from_bps(bps: u32) -> ValidationResult<Self> {
        Self::from_fraction(Decimal::new(i64::from(bps), 4))
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Returns the rate as a fraction.
    #[inline]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }

    /// Returns the rate in whole basis points, rounded.
    pub fn bps(&self) -> u32 {
        (self.0 * Decimal::from(10_000))
            .round()
            .to_u32()
            .unwrap_or(u32::MAX)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = ValidationError;

    fn try_from(fraction: Decimal) -> Result<Self, Self::Error> {
        TaxRate::from_fraction(fraction)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.0
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// Line Source
// =============================================================================

/// What an order or quotation line refers to.
///
/// Product and variant lines are priced from the catalog when a submission is
/// re-priced; custom lines carry an administrator-entered price.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineSource {
    /// A catalog product without variants.
    Product {
        #[serde(rename = "productId")]
        #[ts(type = "string")]
        product_id: Uuid,
    },
    /// A specific variant (size, colour, ...) of a catalog product.
    Variant {
        #[serde(rename = "productId")]
        #[ts(type = "string")]
        product_id: Uuid,
        #[serde(rename = "variantId")]
        #[ts(type = "string")]
        variant_id: Uuid,
    },
    /// A free-text line, typically added to a quotation by hand.
    Custom { name: String },
}

impl fmt::Display for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSource::Product { product_id } => write!(f, "product {}", product_id),
            LineSource::Variant {
                product_id,
                variant_id,
            } => write!(f, "variant {} of product {}", variant_id, product_id),
            LineSource::Custom { name } => write!(f, "custom line '{}'", name),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One line of an order or quotation.
///
/// ## Quantity Semantics
/// A quantity of zero is a line the form is about to remove. It is accepted
/// by validation but contributes nothing to the subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// What the line refers to; absent while a form row is still being filled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub source: Option<LineSource>,

    pub quantity: i64,

    /// Price of a single unit, full precision.
    #[ts(type = "string")]
    pub unit_price: Decimal,
}

impl LineItem {
    /// Creates an unattributed line.
    pub fn new(quantity: i64, unit_price: Decimal) -> Self {
        LineItem {
            source: None,
            quantity,
            unit_price,
        }
    }

    /// Creates a line for a catalog product.
    pub fn product(product_id: Uuid, quantity: i64, unit_price: Decimal) -> Self {
        LineItem {
            source: Some(LineSource::Product { product_id }),
            quantity,
            unit_price,
        }
    }

    /// Creates a free-text line.
    pub fn custom(name: impl Into<String>, quantity: i64, unit_price: Decimal) -> Self {
        LineItem {
            source: Some(LineSource::Custom { name: name.into() }),
            quantity,
            unit_price,
        }
    }

    /// Attaches a source to the line.
    pub fn with_source(mut self, source: LineSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Whether the line contributes to the subtotal.
    #[inline]
    pub fn is_priced(&self) -> bool {
        self.quantity > 0
    }

    /// `quantity × unit_price`, or zero for lines pending removal.
    ///
    /// `None` if the product leaves the Decimal range.
    pub fn line_total(&self) -> Option<Decimal> {
        if self.is_priced() {
            Decimal::from(self.quantity).checked_mul(self.unit_price)
        } else {
            Some(Decimal::ZERO)
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `value` is a percentage of the subtotal (0-100).
    Percentage,
    /// `value` is an amount in currency units.
    Fixed,
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountKind::Percentage => write!(f, "percentage"),
            DiscountKind::Fixed => write!(f, "fixed"),
        }
    }
}

/// A discount applied to the whole order or quotation.
///
/// ## Wire Format
/// ```json
/// { "type": "percentage", "value": "20", "maximumAmount": "15.00" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSpec {
    #[serde(rename = "type")]
    pub kind: DiscountKind,

    #[ts(type = "string")]
    pub value: Decimal,

    /// Upper bound on a percentage discount. Absent or zero means uncapped;
    /// ignored for fixed discounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub maximum_amount: Option<Decimal>,
}

impl DiscountSpec {
    /// An uncapped percentage discount.
    pub fn percentage(value: Decimal) -> Self {
        DiscountSpec {
            kind: DiscountKind::Percentage,
            value,
            maximum_amount: None,
        }
    }

    /// A percentage discount capped at `maximum_amount`.
    pub fn percentage_capped(value: Decimal, maximum_amount: Decimal) -> Self {
        DiscountSpec {
            kind: DiscountKind::Percentage,
            value,
            maximum_amount: Some(maximum_amount),
        }
    }

    /// A flat amount off.
    pub fn fixed(value: Decimal) -> Self {
        DiscountSpec {
            kind: DiscountKind::Fixed,
            value,
            maximum_amount: None,
        }
    }

    /// The cap that actually applies, if any.
    pub fn effective_cap(&self) -> Option<Decimal> {
        match self.kind {
            DiscountKind::Percentage => self.maximum_amount.filter(|cap| *cap > Decimal::ZERO),
            DiscountKind::Fixed => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
