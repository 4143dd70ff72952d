//! # Quotations
//!
//! A quotation is a priced offer a customer accepts or rejects through a
//! public link. Every transition is gated on the current status.
//!
//! ## Status Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Draft ──send──► Sent ──accept──► Accepted ──convert──► Converted      │
//! │     │              │                                                    │
//! │     │ cancel       ├──reject──────► Rejected                            │
//! │     └──────────────┼──────────────► Rejected                            │
//! │                    └──lapsed──────► Expired                             │
//! │                                                                         │
//! │  Only Draft quotations can be edited. Only Sent quotations can be      │
//! │  answered by the customer, and only until valid_until.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::pricing::{PriceCalculator, PricingResult};
use crate::types::{DiscountSpec, LineItem, TaxRate};

// =============================================================================
// Quotation Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    /// Being prepared; items and discount may still change.
    #[default]
    Draft,
    /// Shared with the customer, awaiting an answer.
    Sent,
    Accepted,
    Rejected,
    /// `valid_until` passed without an answer.
    Expired,
    /// Turned into an order.
    Converted,
}

impl QuotationStatus {
    /// Whether `self → next` is an allowed transition.
    pub fn can_transition_to(self, next: QuotationStatus) -> bool {
        use QuotationStatus::*;

        !self.is_terminal()
            && matches!(
                (self, next),
                (Draft, Sent)
                    | (Draft, Rejected)
                    | (Sent, Accepted)
                    | (Sent, Rejected)
                    | (Sent, Expired)
                    | (Accepted, Converted)
            )
    }

    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QuotationStatus::Rejected | QuotationStatus::Expired | QuotationStatus::Converted
        )
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuotationStatus::Draft => "draft",
            QuotationStatus::Sent => "sent",
            QuotationStatus::Accepted => "accepted",
            QuotationStatus::Rejected => "rejected",
            QuotationStatus::Expired => "expired",
            QuotationStatus::Converted => "converted",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Quotation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    #[ts(type = "string")]
    pub id: Uuid,

    /// Human-facing number, e.g. `QT-2026-0042`.
    pub number: String,

    pub status: QuotationStatus,

    pub items: Vec<LineItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub discount: Option<DiscountSpec>,

    #[ts(type = "string")]
    pub tax_rate: TaxRate,

    /// Last moment the customer may answer; absent means open-ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,

    /// When the customer accepted or rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub responded_at: Option<DateTime<Utc>>,
}

impl Quotation {
    /// Creates a draft quotation. The caller allocates `id`.
    pub fn new(
        id: Uuid,
        number: impl Into<String>,
        items: Vec<LineItem>,
        discount: Option<DiscountSpec>,
        tax_rate: TaxRate,
    ) -> Self {
        Quotation {
            id,
            number: number.into(),
            status: QuotationStatus::Draft,
            items,
            discount,
            tax_rate,
            valid_until: None,
            responded_at: None,
        }
    }

    /// Prices the quotation's current items, discount and tax rate.
    pub fn pricing(&self, calculator: &PriceCalculator) -> CoreResult<PricingResult> {
        calculator.price(&self.items, self.discount.as_ref(), self.tax_rate)
    }

    /// Replaces the pricing inputs of a draft.
    pub fn revise(
        &mut self,
        items: Vec<LineItem>,
        discount: Option<DiscountSpec>,
        tax_rate: TaxRate,
    ) -> CoreResult<()> {
        if self.status != QuotationStatus::Draft {
            return Err(self.invalid_transition(QuotationStatus::Draft));
        }

        self.items = items;
        self.discount = discount;
        self.tax_rate = tax_rate;
        Ok(())
    }

    /// Whether the answer window has closed at `now`.
    pub fn is_past_validity(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| now > until)
    }

    /// Shares a draft with the customer.
    pub fn send(&mut self, valid_until: Option<DateTime<Utc>>) -> CoreResult<()> {
        self.transition(QuotationStatus::Sent)?;
        self.valid_until = valid_until;
        Ok(())
    }

    /// Customer accepts through the public link.
    pub fn accept(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.respond(QuotationStatus::Accepted, now)
    }

    /// Customer declines through the public link.
    pub fn reject(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.respond(QuotationStatus::Rejected, now)
    }

    /// Administrator withdraws a draft before sending it.
    pub fn cancel(&mut self) -> CoreResult<()> {
        if self.status != QuotationStatus::Draft {
            return Err(self.invalid_transition(QuotationStatus::Rejected));
        }
        self.transition(QuotationStatus::Rejected)
    }

    /// Moves a sent quotation to `Expired` once `valid_until` has passed.
    ///
    /// Returns whether the status changed.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == QuotationStatus::Sent && self.is_past_validity(now) {
            self.status = QuotationStatus::Expired;
            info!(number = %self.number, "Quotation expired");
            true
        } else {
            false
        }
    }

    /// Marks an accepted quotation as turned into an order.
    pub fn mark_converted(&mut self) -> CoreResult<()> {
        self.transition(QuotationStatus::Converted)
    }

    fn respond(&mut self, next: QuotationStatus, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status != QuotationStatus::Sent {
            return Err(self.invalid_transition(next));
        }

        if let Some(valid_until) = self.valid_until.filter(|_| self.is_past_validity(now)) {
            return Err(CoreError::QuotationExpired {
                number: self.number.clone(),
                valid_until: valid_until.to_rfc3339(),
            });
        }

        self.transition(next)?;
        self.responded_at = Some(now);
        Ok(())
    }

    fn transition(&mut self, next: QuotationStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(self.invalid_transition(next));
        }

        info!(number = %self.number, from = %self.status, to = %next, "Quotation status changed");
        self.status = next;
        Ok(())
    }

    fn invalid_transition(&self, requested: QuotationStatus) -> CoreError {
        CoreError::InvalidQuotationStatus {
            number: self.number.clone(),
            current: self.status.to_string(),
            requested: requested.to_string(),
        }
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
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    const QUOTATION_ID: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

    fn draft() -> Quotation {
        Quotation::new(
            Uuid::parse_str(QUOTATION_ID).unwrap(),
            "QT-2026-0001",
            vec![
                LineItem::new(2, dec!(10.00)),
                LineItem::custom("On-site setup", 1, dec!(30.00)),
            ],
            Some(DiscountSpec::fixed(dec!(5))),
            TaxRate::from_fraction(dec!(0.10)).unwrap(),
        )
    }

    #[test]
    fn test_transition_table() {
        use QuotationStatus::*;

        assert!(Draft.can_transition_to(Sent));
        assert!(Sent.can_transition_to(Accepted));
        assert!(Accepted.can_transition_to(Converted));
        assert!(!Draft.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Expired.can_transition_to(Accepted));
        assert!(Converted.is_terminal());
        assert!(!Sent.is_terminal());
        for next in [Draft, Sent, Accepted, Rejected, Expired, Converted] {
            assert!(!Rejected.can_transition_to(next));
        }
    }

    #[test]
    fn test_pricing() {
        let quotation = draft();
        assert_eq!(quotation.id.to_string(), QUOTATION_ID);
        assert_eq!(quotation.status, QuotationStatus::Draft);

        let result = quotation.pricing(&PriceCalculator::default()).unwrap();
        // (20 + 30 − 5) × 1.10
        assert_eq!(result.subtotal.cents(), 5000);
        assert_eq!(result.taxable_amount.cents(), 4500);
        assert_eq!(result.total.cents(), 4950);
    }

    #[test]
    fn test_accept_flow() {
        let mut quotation = draft();
        quotation.send(Some(now() + Duration::days(14))).unwrap();
        assert_eq!(quotation.status, QuotationStatus::Sent);

        quotation.accept(now()).unwrap();
        assert_eq!(quotation.status, QuotationStatus::Accepted);
        assert_eq!(quotation.responded_at, Some(now()));

        quotation.mark_converted().unwrap();
        assert_eq!(quotation.status, QuotationStatus::Converted);
    }

    #[test]
    fn test_cannot_answer_unsent_quotation() {
        let mut quotation = draft();
        let err = quotation.accept(now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Quotation QT-2026-0001 is draft, cannot move to accepted"
        );
        assert_eq!(quotation.status, QuotationStatus::Draft);
    }

    #[test]
    fn test_cannot_answer_twice() {
        let mut quotation = draft();
        quotation.send(None).unwrap();
        quotation.reject(now()).unwrap();
        assert!(quotation.accept(now()).is_err());
        assert_eq!(quotation.status, QuotationStatus::Rejected);
    }

    #[test]
    fn test_lapsed_quotation_cannot_be_accepted() {
        let mut quotation = draft();
        quotation.send(Some(now() - Duration::hours(1))).unwrap();

        assert!(matches!(
            quotation.accept(now()),
            Err(CoreError::QuotationExpired { .. })
        ));
        assert_eq!(quotation.status, QuotationStatus::Sent);

        assert!(quotation.expire_if_due(now()));
        assert_eq!(quotation.status, QuotationStatus::Expired);
        assert!(!quotation.expire_if_due(now()));
    }

    #[test]
    fn test_only_drafts_are_revised_or_cancelled() {
        let mut quotation = draft();
        quotation
            .revise(vec![LineItem::new(1, dec!(99))], None, TaxRate::zero())
            .unwrap();
        let result = quotation.pricing(&PriceCalculator::default()).unwrap();
        assert_eq!(result.total.cents(), 9900);

        quotation.send(None).unwrap();
        assert!(quotation.revise(vec![], None, TaxRate::zero()).is_err());
        assert!(quotation.cancel().is_err());

        let mut other = draft();
        other.cancel().unwrap();
        assert_eq!(other.status, QuotationStatus::Rejected);
    }
}
