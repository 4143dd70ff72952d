//! # Submission Re-pricing
//!
//! Order and quotation forms send their own totals along with the items.
//! Those totals come from the browser and are only a display hint. This
//! module recomputes them from trusted data before anything is charged or
//! stored.
//!
//! ## Verification Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Submission (untrusted)                                                 │
//! │  ├── items: source + quantity + client unit price                       │
//! │  ├── promoCode | discount                                               │
//! │  ├── taxRate                                                            │
//! │  └── claimed PricingResult                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  SubmissionVerifier::verify                                             │
//! │  ├── product / variant prices ◄── Catalog                               │
//! │  ├── custom line prices       ◄── submission (entered by staff)         │
//! │  ├── promo code               ◄── Catalog, eligibility re-checked       │
//! │  ├── tax rate                 ◄── store rate when configured            │
//! │  └── PriceCalculator          ──► authoritative PricingResult           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Verification: authoritative totals + every field the client got wrong  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{PriceCalculator, PricingBreakdown, PricingResult};
use crate::promo::PromoCode;
use crate::types::{DiscountSpec, LineItem, LineSource, TaxRate};
use crate::validation::{validate_price, validate_promo_code};

// =============================================================================
// Catalog
// =============================================================================

/// Source of trusted prices and promo codes.
pub trait Catalog {
    /// Current unit price of a product or variant; `None` if unknown.
    /// Custom lines never have a catalog price.
    fn unit_price(&self, source: &LineSource) -> Option<Decimal>;

    /// Looks up a promo code by its normalized (upper-case) form.
    fn find_promo_code(&self, code: &str) -> Option<PromoCode>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVariant {
    pub id: Uuid,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: Uuid,
    pub price: Decimal,
    #[serde(default)]
    pub variants: Vec<CatalogVariant>,
}

/// A catalog held entirely in memory, typically loaded from a file.
///
/// ## File Format (TOML)
/// ```toml
/// [[products]]
/// id = "550e8400-e29b-41d4-a716-446655440000"
/// price = "19.99"
///
/// [[products.variants]]
/// id = "6f1c2a52-0d7e-4c1e-9d43-3b1f6f0e2a11"
/// price = "24.99"
///
/// [[promoCodes]]
/// code = "WELCOME"
/// discount = { type = "fixed", value = "5" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InMemoryCatalog {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
    #[serde(default)]
    pub promo_codes: Vec<PromoCode>,
}

impl InMemoryCatalog {
    fn product(&self, id: &Uuid) -> Option<&CatalogProduct> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Checks every product and variant price against the unit price rules.
    ///
    /// ## Errors
    /// `InvalidCatalogPrice` for the first offending entry.
    pub fn validate(&self) -> CoreResult<()> {
        for product in &self.products {
            let source = LineSource::Product {
                product_id: product.id,
            };
            check_catalog_price(&source, product.price)?;

            for variant in &product.variants {
                let source = LineSource::Variant {
                    product_id: product.id,
                    variant_id: variant.id,
                };
                check_catalog_price(&source, variant.price)?;
            }
        }
        Ok(())
    }
}

fn check_catalog_price(source: &LineSource, price: Decimal) -> CoreResult<()> {
    validate_price("price", price).map_err(|reason| CoreError::InvalidCatalogPrice {
        item: source.to_string(),
        reason,
    })
}

impl Catalog for InMemoryCatalog {
    fn unit_price(&self, source: &LineSource) -> Option<Decimal> {
        match source {
            LineSource::Product { product_id } => self.product(product_id).map(|p| p.price),
            LineSource::Variant {
                product_id,
                variant_id,
            } => self
                .product(product_id)?
                .variants
                .iter()
                .find(|v| &v.id == variant_id)
                .map(|v| v.price),
            LineSource::Custom { .. } => None,
        }
    }

    fn find_promo_code(&self, code: &str) -> Option<PromoCode> {
        self.promo_codes.iter().find(|p| p.matches(code)).cloned()
    }
}

// =============================================================================
// Submission
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Order,
    Quotation,
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionKind::Order => write!(f, "order"),
            SubmissionKind::Quotation => write!(f, "quotation"),
        }
    }
}

/// A line as the form submitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedLine {
    pub source: LineSource,
    pub quantity: i64,
    /// The price the form showed. Required for custom lines, a hint otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
}

/// The body of `POST /orders` or `POST /quotations`, as far as pricing goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub kind: SubmissionKind,
    pub items: Vec<SubmittedLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    /// A manual discount entered by staff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountSpec>,
    #[serde(default)]
    pub tax_rate: TaxRate,
    /// Totals the client computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed: Option<PricingResult>,
}

// =============================================================================
// Verification
// =============================================================================

/// A field of [`PricingResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PricingField {
    Subtotal,
    DiscountAmount,
    TaxableAmount,
    TaxAmount,
    Total,
}

impl PricingField {
    pub const ALL: [PricingField; 5] = [
        PricingField::Subtotal,
        PricingField::DiscountAmount,
        PricingField::TaxableAmount,
        PricingField::TaxAmount,
        PricingField::Total,
    ];

    pub fn of(self, result: &PricingResult) -> Money {
        match self {
            PricingField::Subtotal => result.subtotal,
            PricingField::DiscountAmount => result.discount_amount,
            PricingField::TaxableAmount => result.taxable_amount,
            PricingField::TaxAmount => result.tax_amount,
            PricingField::Total => result.total,
        }
    }
}

impl fmt::Display for PricingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PricingField::Subtotal => "subtotal",
            PricingField::DiscountAmount => "discountAmount",
            PricingField::TaxableAmount => "taxableAmount",
            PricingField::TaxAmount => "taxAmount",
            PricingField::Total => "total",
        };
        write!(f, "{}", s)
    }
}

/// Something the client sent that disagrees with the authoritative value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// A line's unit price differs from the catalog.
    UnitPrice {
        index: usize,
        source: LineSource,
        claimed: Decimal,
        authoritative: Decimal,
    },
    /// The submission's tax rate differs from the store rate.
    TaxRate {
        claimed: TaxRate,
        authoritative: TaxRate,
    },
    /// A claimed total differs by more than the tolerance.
    Amount {
        field: PricingField,
        claimed: Money,
        authoritative: Money,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::UnitPrice {
                index,
                source,
                claimed,
                authoritative,
            } => write!(
                f,
                "items[{}] ({}): unit price {} should be {}",
                index, source, claimed, authoritative
            ),
            Discrepancy::TaxRate {
                claimed,
                authoritative,
            } => write!(f, "taxRate: {} should be {}", claimed, authoritative),
            Discrepancy::Amount {
                field,
                claimed,
                authoritative,
            } => write!(f, "{}: {} should be {}", field, claimed, authoritative),
        }
    }
}

/// The outcome of re-pricing a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub kind: SubmissionKind,
    pub tax_rate: TaxRate,
    pub breakdown: PricingBreakdown,
    /// The totals to persist and charge.
    pub authoritative: PricingResult,
    pub discrepancies: Vec<Discrepancy>,
}

impl Verification {
    /// Whether the client's numbers can be taken as-is.
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

// =============================================================================
// Verifier
// =============================================================================

/// Re-prices submissions against a [`Catalog`].
pub struct SubmissionVerifier<'a, C: Catalog + ?Sized> {
    calculator: PriceCalculator,
    catalog: &'a C,
    store_tax_rate: Option<TaxRate>,
    tolerance: Money,
}

impl<'a, C: Catalog + ?Sized> SubmissionVerifier<'a, C> {
    pub fn new(calculator: PriceCalculator, catalog: &'a C) -> Self {
        SubmissionVerifier {
            calculator,
            catalog,
            store_tax_rate: None,
            tolerance: Money::zero(),
        }
    }

    /// Uses `rate` instead of whatever rate the submission carries.
    pub fn with_store_tax_rate(mut self, rate: TaxRate) -> Self {
        self.store_tax_rate = Some(rate);
        self
    }

    /// Claimed totals within `tolerance` of the authoritative ones are accepted.
    pub fn with_tolerance(mut self, tolerance: Money) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    /// Recomputes `submission` from trusted data as of `now`.
    ///
    /// ## Errors
    /// - `ConflictingDiscounts` if both a promo code and a manual discount are present
    /// - `UnknownCatalogItem` for a product or variant the catalog doesn't price
    /// - `InvalidCatalogPrice` when the catalog's own price breaks the unit price rules
    /// - `PromoCodeNotFound` / promo eligibility errors
    /// - `Validation` for malformed lines, missing custom prices, bad discounts
    pub fn verify(&self, submission: &Submission, now: DateTime<Utc>) -> CoreResult<Verification> {
        if submission.promo_code.is_some() && submission.discount.is_some() {
            return Err(CoreError::ConflictingDiscounts);
        }

        let mut discrepancies = Vec::new();
        let items = self.reprice_lines(submission, &mut discrepancies)?;

        let tax_rate = match self.store_tax_rate {
            Some(store_rate) => {
                if store_rate != submission.tax_rate {
                    discrepancies.push(Discrepancy::TaxRate {
                        claimed: submission.tax_rate,
                        authoritative: store_rate,
                    });
                }
                store_rate
            }
            None => submission.tax_rate,
        };

        let breakdown = match &submission.promo_code {
            Some(code) => {
                let code = validate_promo_code(code)?;
                let promo = self
                    .catalog
                    .find_promo_code(&code)
                    .ok_or(CoreError::PromoCodeNotFound(code))?;
                self.calculator
                    .calculate_with_promo(&items, Some(&promo), tax_rate, now)?
            }
            None => self
                .calculator
                .calculate(&items, submission.discount.as_ref(), tax_rate)?,
        };
        let authoritative = breakdown.rounded()?;

        if let Some(claimed) = &submission.claimed {
            for field in PricingField::ALL {
                let claimed_amount = field.of(claimed);
                let authoritative_amount = field.of(&authoritative);
                if claimed_amount.distance(authoritative_amount) > self.tolerance {
                    discrepancies.push(Discrepancy::Amount {
                        field,
                        claimed: claimed_amount,
                        authoritative: authoritative_amount,
                    });
                }
            }
        }

        if discrepancies.is_empty() {
            debug!(kind = %submission.kind, total = %authoritative.total, "Submission verified");
        } else {
            warn!(
                kind = %submission.kind,
                count = discrepancies.len(),
                total = %authoritative.total,
                "Submitted pricing disagrees with authoritative pricing"
            );
        }

        Ok(Verification {
            kind: submission.kind,
            tax_rate,
            breakdown,
            authoritative,
            discrepancies,
        })
    }

    fn reprice_lines(
        &self,
        submission: &Submission,
        discrepancies: &mut Vec<Discrepancy>,
    ) -> CoreResult<Vec<LineItem>> {
        submission
            .items
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let unit_price = match &line.source {
                    LineSource::Custom { .. } => {
                        line.unit_price.ok_or_else(|| ValidationError::Required {
                            field: format!("items[{}].unitPrice", index),
                        })?
                    }
                    source => {
                        let price = self
                            .catalog
                            .unit_price(source)
                            .ok_or_else(|| CoreError::UnknownCatalogItem(source.to_string()))?;
                        check_catalog_price(source, price)?;
                        if let Some(claimed) = line.unit_price.filter(|claimed| *claimed != price) {
                            discrepancies.push(Discrepancy::UnitPrice {
                                index,
                                source: source.clone(),
                                claimed,
                                authoritative: price,
                            });
                        }
                        price
                    }
                };

                Ok(LineItem::new(line.quantity, unit_price).with_source(line.source.clone()))
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
