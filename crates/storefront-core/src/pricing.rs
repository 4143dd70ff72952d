//! # Pricing Module
//!
//! The order/quotation price calculation.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PriceCalculator::calculate                         │
//! │                                                                         │
//! │  items ──► Σ quantity × unit_price ──────────────────► subtotal         │
//! │                                                          │              │
//! │  discount ──► percentage: subtotal × value / 100         │              │
//! │               (capped at maximum_amount)                 │              │
//! │               fixed: value                               │              │
//! │               ...never more than subtotal ──────────► discount_amount  │
//! │                                                          │              │
//! │                              subtotal − discount ────► taxable_amount   │
//! │                                                          │              │
//! │  tax_rate ──────────────────► taxable × rate ────────► tax_amount       │
//! │                                                          │              │
//! │                              taxable + tax ──────────► total            │
//! │                                                                         │
//! │  Tax is ALWAYS applied after the discount, never to the raw subtotal.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Precision
//! Every step runs on `Decimal` without rounding and produces a
//! [`PricingBreakdown`]. [`PricingBreakdown::rounded`] converts to cents once,
//! when the numbers are shown or submitted.
//!
//! ## Example
//! ```rust
//! use rust_decimal::Decimal;
//! use storefront_core::pricing::PriceCalculator;
//! use storefront_core::types::{DiscountSpec, LineItem, TaxRate};
//!
//! let calculator = PriceCalculator::default();
//! let items = vec![LineItem::new(1, Decimal::new(10000, 2))]; // 1 × $100.00
//! let discount = DiscountSpec::percentage_capped(Decimal::from(20), Decimal::from(15));
//!
//! let result = calculator
//!     .price(&items, Some(&discount), TaxRate::zero())
//!     .unwrap();
//!
//! assert_eq!(result.discount_amount.to_string(), "$15.00");
//! assert_eq!(result.total.to_string(), "$85.00");
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::promo::PromoCode;
use crate::types::{DiscountKind, DiscountSpec, LineItem, TaxRate};
use crate::validation::{validate_discount, validate_line_items};
use crate::{DEFAULT_MAX_ITEM_QUANTITY, DEFAULT_MAX_LINE_ITEMS, MAX_UNIT_PRICE};

// =============================================================================
// Policy
// =============================================================================

/// What to do with a percentage discount above 100.
///
/// There is no pass-through option: a value above 100 passed through would
/// still be clamped to the subtotal and price exactly like `Clamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentageOverflow {
    /// Fail validation with a field error on `discount.value`.
    Reject,
    /// Treat the discount as 100%.
    #[default]
    Clamp,
}

impl fmt::Display for PercentageOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentageOverflow::Reject => write!(f, "reject"),
            PercentageOverflow::Clamp => write!(f, "clamp"),
        }
    }
}

impl FromStr for PercentageOverflow {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(PercentageOverflow::Reject),
            "clamp" => Ok(PercentageOverflow::Clamp),
            other => Err(ValidationError::InvalidFormat {
                field: "percentageOverflow".to_string(),
                reason: format!("unknown policy '{}', expected reject or clamp", other),
            }),
        }
    }
}

/// Limits and policies the calculator validates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PricingPolicy {
    pub percentage_overflow: PercentageOverflow,
    pub max_item_quantity: i64,
    pub max_line_items: usize,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            percentage_overflow: PercentageOverflow::default(),
            max_item_quantity: DEFAULT_MAX_ITEM_QUANTITY,
            max_line_items: DEFAULT_MAX_LINE_ITEMS,
        }
    }
}

impl PricingPolicy {
    /// Whether the largest order this policy admits, taxed at 100%, still
    /// fits in `i64` cents.
    ///
    /// ```rust
    /// use storefront_core::PricingPolicy;
    ///
    /// assert!(PricingPolicy::default().fits_in_cents());
    /// let raised = PricingPolicy { max_item_quantity: i64::MAX, ..PricingPolicy::default() };
    /// assert!(!raised.fits_in_cents());
    /// ```
    pub fn fits_in_cents(&self) -> bool {
        let Ok(lines) = i128::try_from(self.max_line_items) else {
            return false;
        };
        i128::from(self.max_item_quantity.max(0))
            .checked_mul(lines)
            .and_then(|units| units.checked_mul(i128::from(MAX_UNIT_PRICE)))
            .and_then(|dollars| dollars.checked_mul(200))
            .is_some_and(|cents| cents <= i128::from(i64::MAX))
    }
}

// =============================================================================
// Results
// =============================================================================

/// Full-precision pricing amounts.
///
/// ## Invariants
/// - `0 <= discount_amount <= subtotal`
/// - `taxable_amount == subtotal - discount_amount`
/// - `total == taxable_amount + tax_amount`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    #[ts(type = "string")]
    pub subtotal: Decimal,
    #[ts(type = "string")]
    pub discount_amount: Decimal,
    #[ts(type = "string")]
    pub taxable_amount: Decimal,
    #[ts(type = "string")]
    pub tax_amount: Decimal,
    #[ts(type = "string")]
    pub total: Decimal,
}

impl PricingBreakdown {
    /// All amounts zero (the empty order).
    pub const fn zero() -> Self {
        PricingBreakdown {
            subtotal: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            taxable_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    /// Rounds to cents for display or submission.
    ///
    /// Subtotal, discount and tax are rounded independently; taxable amount
    /// and total are derived from those rounded parts, so
    /// `taxable_amount + tax_amount == total` holds to the cent.
    pub fn rounded(&self) -> CoreResult<PricingResult> {
        let subtotal = Money::from_decimal(self.subtotal)?;
        let discount_amount = Money::from_decimal(self.discount_amount)?;
        let tax_amount = Money::from_decimal(self.tax_amount)?;
        let taxable_amount = subtotal - discount_amount;
        let total = taxable_amount
            .checked_add(tax_amount)
            .ok_or_else(|| CoreError::AmountOverflow(self.total.to_string()))?;

        Ok(PricingResult {
            subtotal,
            discount_amount,
            taxable_amount,
            tax_amount,
            total,
        })
    }
}

/// Pricing amounts rounded to cents.
///
/// This is what order and quotation forms put into their submission payloads
/// and what summaries display. Amounts serialize as integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub taxable_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
}

// =============================================================================
// Price Calculator
// =============================================================================

/// Computes order and quotation totals.
///
/// The calculator holds only its policy, so it is `Copy` and every call is
/// independent: same input, same output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceCalculator {
    policy: PricingPolicy,
}

impl PriceCalculator {
    pub fn new(policy: PricingPolicy) -> Self {
        PriceCalculator { policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Validates the inputs, then computes the full-precision breakdown.
    ///
    /// ## Errors
    /// - `CoreError::Validation` with a field path for negative quantities or
    ///   prices, too many lines, or a malformed discount
    /// - `CoreError::AmountOverflow` when a policy with raised limits lets the
    ///   subtotal leave the Decimal range
    pub fn calculate(
        &self,
        items: &[LineItem],
        discount: Option<&DiscountSpec>,
        tax_rate: TaxRate,
    ) -> CoreResult<PricingBreakdown> {
        validate_line_items(items, &self.policy)?;
        self.calculate_validated(items, Self::subtotal(items)?, discount, tax_rate)
    }

    /// [`calculate`](Self::calculate), rounded to cents.
    pub fn price(
        &self,
        items: &[LineItem],
        discount: Option<&DiscountSpec>,
        tax_rate: TaxRate,
    ) -> CoreResult<PricingResult> {
        self.calculate(items, discount, tax_rate)?.rounded()
    }

    /// Prices with a promo code's discount after checking the code applies.
    ///
    /// Eligibility (active flag, validity window, usage limit, minimum order)
    /// is judged against the subtotal of `items` at `now`, once the lines
    /// themselves have passed validation.
    pub fn calculate_with_promo(
        &self,
        items: &[LineItem],
        promo: Option<&PromoCode>,
        tax_rate: TaxRate,
        now: DateTime<Utc>,
    ) -> CoreResult<PricingBreakdown> {
        let Some(promo) = promo else {
            return self.calculate(items, None, tax_rate);
        };

        validate_line_items(items, &self.policy)?;
        let subtotal = Self::subtotal(items)?;
        let discount = promo.resolve(subtotal, now)?;
        self.calculate_validated(items, subtotal, Some(discount), tax_rate)
    }

    /// Sum of `quantity × unit_price` over lines with a positive quantity.
    ///
    /// ## Errors
    /// `CoreError::AmountOverflow` if a line total or the sum leaves the
    /// Decimal range.
    pub fn subtotal(items: &[LineItem]) -> CoreResult<Decimal> {
        items.iter().try_fold(Decimal::ZERO, |sum, item| {
            item.line_total()
                .and_then(|total| sum.checked_add(total))
                .ok_or_else(|| {
                    let line = format!("{} × {}", item.quantity, item.unit_price);
                    CoreError::AmountOverflow(line)
                })
        })
    }

    /// The discount amount for `subtotal`, never more than `subtotal`.
    ///
    /// ## Resolution
    /// - none, or a value of zero or less: `0`
    /// - percentage: `subtotal × min(value, 100) / 100`, then the cap if any
    /// - fixed: `value`
    ///
    /// Whatever the kind, the result is finally clamped to `subtotal`.
    pub fn resolve_discount(&self, subtotal: Decimal, discount: Option<&DiscountSpec>) -> Decimal {
        let Some(discount) = discount else {
            return Decimal::ZERO;
        };
        if discount.value <= Decimal::ZERO || subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let amount = match discount.kind {
            DiscountKind::Percentage => {
                let pct = discount.value.min(Decimal::ONE_HUNDRED);
                let raw = subtotal * (pct / Decimal::ONE_HUNDRED);
                match discount.effective_cap() {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            DiscountKind::Fixed => discount.value,
        };

        amount.min(subtotal)
    }

    /// Prices lines that already passed `validate_line_items`.
    fn calculate_validated(
        &self,
        items: &[LineItem],
        subtotal: Decimal,
        discount: Option<&DiscountSpec>,
        tax_rate: TaxRate,
    ) -> CoreResult<PricingBreakdown> {
        if let Some(discount) = discount {
            validate_discount(discount, self.policy.percentage_overflow)?;
        }

        let breakdown = self.compute(subtotal, discount, tax_rate)?;
        debug!(
            lines = items.len(),
            subtotal = %breakdown.subtotal,
            discount = %breakdown.discount_amount,
            tax_rate = %tax_rate,
            total = %breakdown.total,
            "Priced line items"
        );
        Ok(breakdown)
    }

    fn compute(
        &self,
        subtotal: Decimal,
        discount: Option<&DiscountSpec>,
        tax_rate: TaxRate,
    ) -> CoreResult<PricingBreakdown> {
        let discount_amount = self.resolve_discount(subtotal, discount);
        let taxable_amount = subtotal - discount_amount;
        let tax_amount = taxable_amount * tax_rate.fraction();
        let total = taxable_amount
            .checked_add(tax_amount)
            .ok_or_else(|| CoreError::AmountOverflow(taxable_amount.to_string()))?;

        Ok(PricingBreakdown {
            subtotal,
            discount_amount,
            taxable_amount,
            tax_amount,
            total,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rate(fraction: Decimal) -> TaxRate {
        TaxRate::from_fraction(fraction).unwrap()
    }

    #[test]
    fn test_no_discount_with_tax() {
        let calculator = PriceCalculator::default();
        let items = vec![LineItem::new(2, dec!(10.00))];

        let breakdown = calculator.calculate(&items, None, rate(dec!(0.11))).unwrap();
        assert_eq!(breakdown.subtotal, dec!(20.00));
        assert_eq!(breakdown.discount_amount, dec!(0));
        assert_eq!(breakdown.taxable_amount, dec!(20.00));
        assert_eq!(breakdown.tax_amount, dec!(2.20));
        assert_eq!(breakdown.total, dec!(22.20));

        let result = breakdown.rounded().unwrap();
        assert_eq!(result.subtotal.cents(), 2000);
        assert_eq!(result.tax_amount.cents(), 220);
        assert_eq!(result.total.cents(), 2220);
    }

    #[test]
    fn test_percentage_discount_is_capped() {
        let calculator = PriceCalculator::default();
        let items = vec![LineItem::new(1, dec!(100.00))];
        let discount = DiscountSpec::percentage_capped(dec!(20), dec!(15));

        let breakdown = calculator
            .calculate(&items, Some(&discount), TaxRate::zero())
            .unwrap();
        assert_eq!(breakdown.discount_amount, dec!(15));
        assert_eq!(breakdown.taxable_amount, dec!(85.00));
        assert_eq!(breakdown.total, dec!(85.00));
    }

    #[test]
    fn test_fixed_discount_clamped_to_subtotal() {
        let calculator = PriceCalculator::default();
        let items = vec![LineItem::new(3, dec!(5.00))];
        let discount = DiscountSpec::fixed(dec!(50));

        let result = calculator
            .price(&items, Some(&discount), rate(dec!(0.10)))
            .unwrap();
        assert_eq!(result.subtotal.cents(), 1500);
        assert_eq!(result.discount_amount.cents(), 1500);
        assert_eq!(result.taxable_amount.cents(), 0);
        assert_eq!(result.tax_amount.cents(), 0);
        assert_eq!(result.total.cents(), 0);
    }

    #[test]
    fn test_empty_items_price_to_zero() {
        let calculator = PriceCalculator::default();
        let discount = DiscountSpec::fixed(dec!(10));

        let breakdown = calculator
            .calculate(&[], Some(&discount), rate(dec!(0.2)))
            .unwrap();
        assert_eq!(breakdown, PricingBreakdown::zero());
        assert_eq!(breakdown.rounded().unwrap(), PricingResult::default());
    }

    #[test]
    fn test_tax_applies_after_discount() {
        let calculator = PriceCalculator::default();
        let items = vec![LineItem::new(1, dec!(200.00))];
        let discount = DiscountSpec::percentage(dec!(50));

        let breakdown = calculator
            .calculate(&items, Some(&discount), rate(dec!(0.10)))
            .unwrap();
        // 10% of the discounted $100, not of the $200 subtotal.
        assert_eq!(breakdown.tax_amount, dec!(10.00));
        assert_eq!(breakdown.total, dec!(110.00));
    }

    #[test]
    fn test_zero_quantity_lines_are_excluded() {
        let calculator = PriceCalculator::default();
        let items = vec![LineItem::new(0, dec!(99.00)), LineItem::new(1, dec!(1.00))];

        let breakdown = calculator.calculate(&items, None, TaxRate::zero()).unwrap();
        assert_eq!(breakdown.subtotal, dec!(1.00));
    }

    #[test]
    fn test_zero_or_missing_discount_is_no_discount() {
        let calculator = PriceCalculator::default();
        assert_eq!(calculator.resolve_discount(dec!(100), None), dec!(0));
        assert_eq!(
            calculator.resolve_discount(dec!(100), Some(&DiscountSpec::percentage(dec!(0)))),
            dec!(0)
        );
        assert_eq!(
            calculator.resolve_discount(dec!(100), Some(&DiscountSpec::fixed(dec!(0)))),
            dec!(0)
        );
    }

    #[test]
    fn test_zero_cap_means_uncapped() {
        let calculator = PriceCalculator::default();
        let discount = DiscountSpec::percentage_capped(dec!(20), dec!(0));
        assert_eq!(calculator.resolve_discount(dec!(100), Some(&discount)), dec!(20));
    }

    #[test]
    fn test_percentage_overflow_policies() {
        let items = vec![LineItem::new(1, dec!(80.00))];
        let discount = DiscountSpec::percentage(dec!(150));

        let clamp = PriceCalculator::default();
        let breakdown = clamp
            .calculate(&items, Some(&discount), rate(dec!(0.1)))
            .unwrap();
        assert_eq!(breakdown.discount_amount, dec!(80.00));
        assert_eq!(breakdown.total, dec!(0));

        let reject = PriceCalculator::new(PricingPolicy {
            percentage_overflow: PercentageOverflow::Reject,
            ..PricingPolicy::default()
        });
        let err = reject
            .calculate(&items, Some(&discount), rate(dec!(0.1)))
            .unwrap_err();
        match err {
            CoreError::Validation(ValidationError::OutOfRange { field, .. }) => {
                assert_eq!(field, "discount.value")
            }
            other => panic!("expected an out-of-range error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let calculator = PriceCalculator::default();

        let negative_qty = vec![LineItem::new(-1, dec!(10.00))];
        assert!(calculator
            .calculate(&negative_qty, None, TaxRate::zero())
            .is_err());

        let negative_price = vec![LineItem::new(1, dec!(-10.00))];
        assert!(calculator
            .calculate(&negative_price, None, TaxRate::zero())
            .is_err());

        let items = vec![LineItem::new(1, dec!(10.00))];
        let negative_discount = DiscountSpec::fixed(dec!(-5));
        assert!(calculator
            .calculate(&items, Some(&negative_discount), TaxRate::zero())
            .is_err());
    }

    #[test]
    fn test_calculate_with_promo() {
        use chrono::TimeZone;

        let now = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        let calculator = PriceCalculator::default();
        let promo = PromoCode {
            minimum_order_amount: Some(dec!(30)),
            ..PromoCode::new("SAVE5", DiscountSpec::fixed(dec!(5))).unwrap()
        };

        let items = vec![LineItem::new(2, dec!(20.00))];
        let breakdown = calculator
            .calculate_with_promo(&items, Some(&promo), TaxRate::zero(), now)
            .unwrap();
        assert_eq!(breakdown.discount_amount, dec!(5));
        assert_eq!(breakdown.total, dec!(35.00));

        // Invalid lines are reported before the minimum order is judged.
        let invalid = vec![LineItem::new(-1, dec!(20.00))];
        assert!(matches!(
            calculator.calculate_with_promo(&invalid, Some(&promo), TaxRate::zero(), now),
            Err(CoreError::Validation(_))
        ));

        let small = vec![LineItem::new(1, dec!(20.00))];
        assert!(matches!(
            calculator.calculate_with_promo(&small, Some(&promo), TaxRate::zero(), now),
            Err(CoreError::MinimumOrderNotMet { .. })
        ));
    }

    #[test]
    fn test_oversized_subtotal_is_an_error() {
        let calculator = PriceCalculator::new(PricingPolicy {
            max_item_quantity: i64::MAX,
            ..PricingPolicy::default()
        });
        assert!(!calculator.policy().fits_in_cents());
        let items = vec![LineItem::new(i64::MAX, Decimal::from(MAX_UNIT_PRICE)); 10];

        assert!(matches!(
            calculator.calculate(&items, None, TaxRate::zero()),
            Err(CoreError::AmountOverflow(_))
        ));
        assert!(matches!(
            PriceCalculator::subtotal(&items),
            Err(CoreError::AmountOverflow(_))
        ));

        // Inside Decimal range but beyond i64 cents: caught when rounding.
        let one_line = &items[..1];
        let breakdown = calculator.calculate(one_line, None, TaxRate::zero()).unwrap();
        assert!(matches!(breakdown.rounded(), Err(CoreError::AmountOverflow(_))));
    }

    #[test]
    fn test_rounding_happens_once() {
        // 3 × $0.335 = $1.005; rounding per line would give 3 × $0.34 = $1.02.
        let calculator = PriceCalculator::default();
        let items = vec![LineItem::new(3, dec!(0.335))];

        let result = calculator.price(&items, None, TaxRate::zero()).unwrap();
        assert_eq!(result.subtotal.cents(), 101);
    }

    #[test]
    fn test_result_wire_format() {
        let calculator = PriceCalculator::default();
        let items = vec![LineItem::new(2, dec!(10.00))];
        let result = calculator.price(&items, None, rate(dec!(0.11))).unwrap();

        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["subtotal"], 2000);
        assert_eq!(json["discountAmount"], 0);
        assert_eq!(json["taxableAmount"], 2000);
        assert_eq!(json["taxAmount"], 220);
        assert_eq!(json["total"], 2220);
    }

    #[test]
    fn test_percentage_overflow_from_str() {
        assert_eq!(
            "Reject".parse::<PercentageOverflow>().unwrap(),
            PercentageOverflow::Reject
        );
        assert_eq!(
            "clamp".parse::<PercentageOverflow>().unwrap(),
            PercentageOverflow::Clamp
        );
        assert!("pass".parse::<PercentageOverflow>().is_err());
    }
}

// =============================================================================
// Property Tests
// =============================================================================
