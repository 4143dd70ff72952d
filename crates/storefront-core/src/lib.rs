//! # storefront-core: Pure Pricing Logic for Storefront
//!
//! This crate prices orders and quotations. The order form, the quotation
//! form and the server that receives their submissions all call the same
//! functions, so the total a customer sees is the total that gets stored.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Storefront Pricing Flow                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Order form / Quotation form (browser)                  │   │
//! │  │    edit lines ──► pick discount ──► preview totals ──► submit   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON payload + claimed totals          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           storefront-pricing (CLI / server edge)                │   │
//! │  │    config, catalog file, logging, exit status                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │ pricing  │ │  promo   │ │    submission    │  │   │
//! │  │   │ LineItem │ │Calculator│ │PromoCode │ │ SubmissionVerifier│ │   │
//! │  │   │ Discount │ │ Breakdown│ │  rules   │ │     Catalog      │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐                       │   │
//! │  │   │  money   │ │validation│ │quotation │                       │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘                       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Line items, discounts, tax rates
//! - [`pricing`] - The price calculator and its results
//! - [`money`] - Cent-denominated money and currency rounding
//! - [`promo`] - Promo codes and their redemption rules
//! - [`quotation`] - Quotation status flow
//! - [`submission`] - Authoritative re-pricing of submitted forms
//! - [`validation`] - Field-level input checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Same input, same output. `now` is always a parameter
//! 2. **Exact Arithmetic**: Decimal internally, rounded to cents once at the end
//! 3. **Explicit Errors**: Typed errors with field paths, never panics
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use storefront_core::{DiscountSpec, LineItem, PriceCalculator, TaxRate};
//!
//! let items = vec![
//!     LineItem::new(2, Decimal::new(10_00, 2)),  // 2 × $10.00
//!     LineItem::new(1, Decimal::new(5_50, 2)),   // 1 × $5.50
//! ];
//! let discount = DiscountSpec::percentage(Decimal::from(10));
//! let tax_rate = TaxRate::from_percentage(Decimal::from(11)).unwrap();
//!
//! let result = PriceCalculator::default()
//!     .price(&items, Some(&discount), tax_rate)
//!     .unwrap();
//!
//! // $25.50 − $2.55 = $22.95, plus 11% tax ($2.52) = $25.47
//! assert_eq!(result.subtotal.cents(), 2550);
//! assert_eq!(result.discount_amount.cents(), 255);
//! assert_eq!(result.tax_amount.cents(), 252);
//! assert_eq!(result.total.cents(), 2547);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod promo;
pub mod quotation;
pub mod submission;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use storefront_core::Money` instead of
// `use storefront_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{
    PercentageOverflow, PriceCalculator, PricingBreakdown, PricingPolicy, PricingResult,
};
pub use promo::PromoCode;
pub use quotation::{Quotation, QuotationStatus};
pub use submission::{Catalog, InMemoryCatalog, Submission, SubmissionVerifier, Verification};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default maximum quantity on a single line.
///
/// ## Business Reason
/// Catches typos like 10000 instead of 10 before they reach an invoice.
/// Overridable through [`PricingPolicy`].
pub const DEFAULT_MAX_ITEM_QUANTITY: i64 = 10_000;

/// Default maximum number of lines in one order or quotation.
pub const DEFAULT_MAX_LINE_ITEMS: usize = 500;

/// Largest accepted unit price, in whole currency units.
///
/// Under the default limits every total fits in `i64` cents. A policy whose
/// limits are raised past [`PricingPolicy::fits_in_cents`] can produce totals
/// that don't, and pricing then fails with `CoreError::AmountOverflow`.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000;

/// Most decimal places a unit price or discount value may carry.
pub const MAX_PRICE_SCALE: u32 = 4;
