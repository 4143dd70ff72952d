//! # Promo Codes
//!
//! A promo code is a [`DiscountSpec`] guarded by redemption rules.
//!
//! ## Eligibility Checks (in order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check_eligibility(subtotal, now)                                       │
//! │                                                                         │
//! │  is_active?            no ──► PromoCodeInactive                         │
//! │  now >= starts_at?     no ──► PromoCodeNotYetValid                      │
//! │  now <= expires_at?    no ──► PromoCodeExpired                          │
//! │  times_used < limit?   no ──► PromoCodeExhausted                        │
//! │  subtotal >= minimum?  no ──► MinimumOrderNotMet                        │
//! │                                                                         │
//! │  all yes ──► Ok, the code's DiscountSpec applies                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `now` is always a parameter. This module never reads a clock, so the same
//! check gives the same answer in the browser and on the server.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::round_currency;
use crate::types::DiscountSpec;
use crate::validation::{validate_promo_code, ValidationResult};

fn default_active() -> bool {
    true
}

/// A redeemable discount code.
///
/// ## Catalog File Format
/// ```toml
/// [[promoCodes]]
/// code = "SUMMER20"
/// discount = { type = "percentage", value = "20", maximumAmount = "50" }
/// minimumOrderAmount = "100"
/// expiresAt = "2026-09-01T00:00:00Z"
/// usageLimit = 500
/// timesUsed = 12
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    /// Upper-case code as customers type it.
    pub code: String,

    pub discount: DiscountSpec,

    /// Subtotal the order must reach before the code applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub minimum_order_amount: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Total redemptions allowed; absent means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,

    #[serde(default)]
    pub times_used: u32,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl PromoCode {
    /// Creates an active, unrestricted promo code.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use storefront_core::promo::PromoCode;
    /// use storefront_core::types::DiscountSpec;
    ///
    /// let promo = PromoCode::new("welcome", DiscountSpec::fixed(Decimal::from(5))).unwrap();
    /// assert_eq!(promo.code, "WELCOME");
    /// assert!(promo.matches(" Welcome "));
    /// ```
    pub fn new(code: &str, discount: DiscountSpec) -> ValidationResult<Self> {
        Ok(PromoCode {
            code: validate_promo_code(code)?,
            discount,
            minimum_order_amount: None,
            starts_at: None,
            expires_at: None,
            usage_limit: None,
            times_used: 0,
            is_active: true,
        })
    }

    /// Case-insensitive comparison against what a customer typed.
    pub fn matches(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
    }

    /// Redemptions left, or `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<u32> {
        self.usage_limit
            .map(|limit| limit.saturating_sub(self.times_used))
    }

    /// Checks every redemption rule against an order subtotal at `now`.
    pub fn check_eligibility(&self, subtotal: Decimal, now: DateTime<Utc>) -> CoreResult<()> {
        let result = self.evaluate(subtotal, now);
        if let Err(err) = &result {
            debug!(code = %self.code, %subtotal, reason = %err, "Promo code not applicable");
        }
        result
    }

    /// The discount this code grants, once eligibility has been confirmed.
    pub fn resolve(&self, subtotal: Decimal, now: DateTime<Utc>) -> CoreResult<&DiscountSpec> {
        self.check_eligibility(subtotal, now)?;
        Ok(&self.discount)
    }

    fn evaluate(&self, subtotal: Decimal, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.is_active {
            return Err(CoreError::PromoCodeInactive {
                code: self.code.clone(),
            });
        }

        if let Some(starts_at) = self.starts_at {
            if now < starts_at {
                return Err(CoreError::PromoCodeNotYetValid {
                    code: self.code.clone(),
                });
            }
        }

        if let Some(expires_at) = self.expires_at {
            if now > expires_at {
                return Err(CoreError::PromoCodeExpired {
                    code: self.code.clone(),
                });
            }
        }

        if let (Some(limit), Some(0)) = (self.usage_limit, self.remaining_uses()) {
            return Err(CoreError::PromoCodeExhausted {
                code: self.code.clone(),
                limit,
            });
        }

        if let Some(minimum) = self.minimum_order_amount {
            if subtotal < minimum {
                return Err(CoreError::MinimumOrderNotMet {
                    code: self.code.clone(),
                    minimum: round_currency(minimum).to_string(),
                    subtotal: round_currency(subtotal).to_string(),
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn summer() -> PromoCode {
        PromoCode::new("summer20", DiscountSpec::percentage(dec!(20))).unwrap()
    }

    #[test]
    fn test_new_normalizes_code() {
        let promo = summer();
        assert_eq!(promo.code, "SUMMER20");
        assert!(promo.matches("summer20"));
        assert!(!promo.matches("SUMMER10"));
        assert!(PromoCode::new("x", DiscountSpec::fixed(dec!(1))).is_err());
    }

    #[test]
    fn test_unrestricted_code_is_eligible() {
        let promo = summer();
        assert!(promo.check_eligibility(dec!(0), now()).is_ok());
        assert_eq!(promo.remaining_uses(), None);
        assert_eq!(
            promo.resolve(dec!(10), now()).unwrap(),
            &DiscountSpec::percentage(dec!(20))
        );
    }

    #[test]
    fn test_inactive_code() {
        let promo = PromoCode {
            is_active: false,
            ..summer()
        };
        assert!(matches!(
            promo.check_eligibility(dec!(100), now()),
            Err(CoreError::PromoCodeInactive { .. })
        ));
    }

    #[test]
    fn test_validity_window() {
        let promo = PromoCode {
            starts_at: Some(now() + Duration::days(1)),
            ..summer()
        };
        assert!(matches!(
            promo.check_eligibility(dec!(100), now()),
            Err(CoreError::PromoCodeNotYetValid { .. })
        ));

        let promo = PromoCode {
            expires_at: Some(now() - Duration::seconds(1)),
            ..summer()
        };
        assert!(matches!(
            promo.check_eligibility(dec!(100), now()),
            Err(CoreError::PromoCodeExpired { .. })
        ));

        // Both bounds are inclusive.
        let promo = PromoCode {
            starts_at: Some(now()),
            expires_at: Some(now()),
            ..summer()
        };
        assert!(promo.check_eligibility(dec!(100), now()).is_ok());
    }

    #[test]
    fn test_usage_limit() {
        let promo = PromoCode {
            usage_limit: Some(3),
            times_used: 2,
            ..summer()
        };
        assert_eq!(promo.remaining_uses(), Some(1));
        assert!(promo.check_eligibility(dec!(100), now()).is_ok());

        let promo = PromoCode {
            times_used: 3,
            ..promo
        };
        assert_eq!(promo.remaining_uses(), Some(0));
        assert!(matches!(
            promo.check_eligibility(dec!(100), now()),
            Err(CoreError::PromoCodeExhausted { limit: 3, .. })
        ));
    }

    #[test]
    fn test_minimum_order() {
        let promo = PromoCode {
            minimum_order_amount: Some(dec!(50.00)),
            ..summer()
        };
        assert!(promo.check_eligibility(dec!(50), now()).is_ok());

        let err = promo.check_eligibility(dec!(49.994), now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Promo code SUMMER20 requires a minimum order of 50.00, subtotal is 49.99"
        );
    }

    #[test]
    fn test_catalog_json_defaults() {
        let promo: PromoCode = serde_json::from_str(
            r#"{"code": "FLAT5", "discount": {"type": "fixed", "value": "5"}}"#,
        )
        .unwrap();
        assert!(promo.is_active);
        assert_eq!(promo.times_used, 0);
        assert_eq!(promo.usage_limit, None);
    }
}
