//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule failures (promo, quotation, ...) │
//! │  └── ValidationError  - Input validation failures (form fields)        │
//! │                                                                         │
//! │  pricing-cli errors (in app)                                           │
//! │  ├── ConfigError      - Bad configuration values                       │
//! │  └── anyhow::Error    - I/O context at the binary edge                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → anyhow → exit status              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages are written for the person filling in the form: they name the
//! field path, the promo code or the quotation number involved.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Pricing, promo code and quotation failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Promo code is switched off by an administrator.
    #[error("Promo code {code} is not active")]
    PromoCodeInactive { code: String },

    /// Promo code validity window has not started yet.
    #[error("Promo code {code} is not valid yet")]
    PromoCodeNotYetValid { code: String },

    /// Promo code validity window has ended.
    #[error("Promo code {code} has expired")]
    PromoCodeExpired { code: String },

    /// Promo code has been redeemed as many times as allowed.
    #[error("Promo code {code} has reached its usage limit of {limit}")]
    PromoCodeExhausted { code: String, limit: u32 },

    /// Order subtotal is below the promo code's minimum.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart subtotal: $40.00, code SAVE10 needs $50.00
    ///      │
    ///      ▼
    /// MinimumOrderNotMet { code: "SAVE10", minimum: "50.00", subtotal: "40.00" }
    ///      │
    ///      ▼
    /// UI shows: "Spend $10.00 more to use SAVE10"
    /// ```
    #[error("Promo code {code} requires a minimum order of {minimum}, subtotal is {subtotal}")]
    MinimumOrderNotMet {
        code: String,
        minimum: String,
        subtotal: String,
    },

    /// Promo code does not exist in the catalog.
    #[error("Promo code not found: {0}")]
    PromoCodeNotFound(String),

    /// Submitted line references a product or variant the catalog doesn't price.
    #[error("No catalog price for {0}")]
    UnknownCatalogItem(String),

    /// The catalog itself carries a price no form would accept.
    #[error("Catalog price for {item} is invalid: {reason}")]
    InvalidCatalogPrice {
        item: String,
        #[source]
        reason: ValidationError,
    },

    /// A submission carried both a promo code and a manual discount.
    #[error("A submission may carry a promo code or a manual discount, not both")]
    ConflictingDiscounts,

    /// Quotation is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Accepting a quotation that was never sent
    /// - Rejecting a quotation that was already accepted
    /// - Converting a quotation that is not accepted
    #[error("Quotation {number} is {current}, cannot move to {requested}")]
    InvalidQuotationStatus {
        number: String,
        current: String,
        requested: String,
    },

    /// Quotation's validity date has passed.
    #[error("Quotation {number} expired on {valid_until}")]
    QuotationExpired { number: String, valid_until: String },

    /// An amount did not fit in the cent representation.
    #[error("Amount {0} is too large to represent")]
    AmountOverflow(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// `field` is a path the form layer can map back to an input, such as
/// `items[2].quantity` or `discount.value`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Decimal value carries more fractional digits than allowed.
    #[error("{field} must have at most {max} decimal places")]
    TooPrecise { field: String, max: u32 },

    /// Invalid format (e.g., bad promo code characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
