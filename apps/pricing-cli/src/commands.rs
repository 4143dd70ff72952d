//! # Commands
//!
//! ```text
//! storefront-pricing quote  <payload.json>     [--json]
//! storefront-pricing verify <submission.json>  [--json] [--at <rfc3339>]
//! ```
//!
//! Both commands take their input as a string and return a value, so the
//! binary only does file I/O, printing and exit codes.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storefront_core::submission::{
    InMemoryCatalog, Submission, SubmissionVerifier, Verification,
};
use storefront_core::{DiscountSpec, LineItem, PricingBreakdown, PricingResult, TaxRate};
use tracing::{debug, info};

use crate::config::PricingConfig;

const ENVIRONMENT_HELP: &str = "\
Environment:
  STOREFRONT_CONFIG   config file (default: platform config dir, pricing.toml)
  STOREFRONT_CATALOG  catalog file used by verify
  STOREFRONT_LOG      log filter (default: info)";

// =============================================================================
// Argument Parsing
// =============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "storefront-pricing",
    version,
    about = "Price order and quotation forms and re-check submitted totals",
    after_help = ENVIRONMENT_HELP
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Price a `{items, discount, taxRate}` payload.
    Quote {
        payload: PathBuf,
        /// Print the breakdown as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Re-price a submitted order or quotation against the catalog.
    Verify {
        submission: PathBuf,
        /// Print the verification as JSON instead of a table.
        #[arg(long)]
        json: bool,
        /// Judge promo code validity at this instant instead of now.
        #[arg(long, value_name = "RFC3339")]
        at: Option<DateTime<Utc>>,
    },
}

// =============================================================================
// Quote
// =============================================================================

/// What an order or quotation form sends to be priced.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePayload {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub discount: Option<DiscountSpec>,
    #[serde(default)]
    pub tax_rate: Option<TaxRate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub tax_rate: TaxRate,
    pub breakdown: PricingBreakdown,
    pub result: PricingResult,
}

/// Prices a `{items, discount, taxRate}` JSON payload.
///
/// A payload without `taxRate` uses the configured store rate, or no tax.
pub fn quote(payload: &str, config: &PricingConfig) -> Result<Quote> {
    let payload: QuotePayload =
        serde_json::from_str(payload).context("Failed to parse quote payload")?;

    let tax_rate = match payload.tax_rate {
        Some(rate) => rate,
        None => config.tax_rate()?.unwrap_or_default(),
    };

    let breakdown = config
        .calculator()
        .calculate(&payload.items, payload.discount.as_ref(), tax_rate)?;
    let result = breakdown.rounded()?;

    info!(lines = payload.items.len(), total = %result.total, "Quote priced");
    Ok(Quote {
        tax_rate,
        breakdown,
        result,
    })
}

// =============================================================================
// Verify
// =============================================================================

/// Reads and validates a catalog file; `.toml` files are TOML, anything
/// else JSON.
pub fn load_catalog(path: &Path) -> Result<InMemoryCatalog> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;

    let catalog: InMemoryCatalog = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?
    };

    catalog
        .validate()
        .with_context(|| format!("Invalid catalog {}", path.display()))?;

    debug!(
        path = %path.display(),
        products = catalog.products.len(),
        promo_codes = catalog.promo_codes.len(),
        "Catalog loaded"
    );
    Ok(catalog)
}

/// Re-prices a JSON submission against `catalog` as of `now`.
pub fn verify(
    submission: &str,
    catalog: &InMemoryCatalog,
    config: &PricingConfig,
    now: DateTime<Utc>,
) -> Result<Verification> {
    let submission: Submission =
        serde_json::from_str(submission).context("Failed to parse submission")?;

    let mut verifier =
        SubmissionVerifier::new(config.calculator(), catalog).with_tolerance(config.tolerance());
    if let Some(rate) = config.tax_rate()? {
        verifier = verifier.with_store_tax_rate(rate);
    }

    let verification = verifier.verify(&submission, now)?;
    info!(
        kind = %verification.kind,
        total = %verification.authoritative.total,
        consistent = verification.is_consistent(),
        "Submission re-priced"
    );
    Ok(verification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use storefront_core::submission::Discrepancy;
    use storefront_core::{CoreError, Money};

    fn parse(list: &[&str]) -> Result<Command, clap::Error> {
        let args = std::iter::once("storefront-pricing").chain(list.iter().copied());
        Cli::try_parse_from(args).map(|cli| cli.command)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
    }

    const CATALOG: &str = r#"
[[products]]
id = "550e8400-e29b-41d4-a716-446655440000"
price = "12.50"

[[promoCodes]]
code = "AUTUMN"
discount = { type = "percentage", value = "20", maximumAmount = "4" }
expiresAt = "2026-11-30T23:59:59Z"
"#;

    fn catalog() -> InMemoryCatalog {
        toml::from_str(CATALOG).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse(&["quote", "cart.json"]).unwrap(),
            Command::Quote {
                payload: PathBuf::from("cart.json"),
                json: false
            }
        );
        assert_eq!(
            parse(&["verify", "--json", "order.json", "--at", "2026-10-01T12:00:00Z"]).unwrap(),
            Command::Verify {
                submission: PathBuf::from("order.json"),
                json: true,
                at: Some(now()),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        use clap::error::ErrorKind;

        assert_eq!(
            parse(&["quote"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert!(parse(&["quote", "a.json", "b.json"]).is_err());
        assert_eq!(
            parse(&["quote", "a.json", "--at", "2026-10-01T12:00:00Z"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
        assert_eq!(
            parse(&["verify", "a.json", "--at", "yesterday"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["refund", "a.json"]).unwrap_err().kind(),
            ErrorKind::InvalidSubcommand
        );
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_help_lists_environment() {
        use clap::CommandFactory;

        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("STOREFRONT_CATALOG"));
        assert!(help.contains("verify"));
    }

    #[test]
    fn test_quote() {
        let payload = r#"{
            "items": [
                { "quantity": 2, "unitPrice": "10.00" },
                { "quantity": 1, "unitPrice": "5.50" }
            ],
            "discount": { "type": "percentage", "value": "10" },
            "taxRate": "0.11"
        }"#;

        let quote = quote(payload, &PricingConfig::default()).unwrap();
        assert_eq!(quote.result.subtotal, Money::from_cents(2550));
        assert_eq!(quote.result.discount_amount, Money::from_cents(255));
        assert_eq!(quote.result.total, Money::from_cents(2547));
    }

    #[test]
    fn test_quote_uses_configured_tax_rate() {
        let mut config = PricingConfig::default();
        config.pricing.tax_rate_bps = Some(1000);

        let payload = r#"{"items": [{"quantity": 1, "unitPrice": "20"}]}"#;
        let quote = quote(payload, &config).unwrap();
        assert_eq!(quote.tax_rate.bps(), 1000);
        assert_eq!(quote.result.total, Money::from_cents(2200));
    }

    #[test]
    fn test_quote_rejects_invalid_input() {
        let err = quote(
            r#"{"items": [{"quantity": -1, "unitPrice": "20"}]}"#,
            &PricingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::Validation(_))
        ));

        assert!(quote("not json", &PricingConfig::default()).is_err());
    }

    #[test]
    fn test_verify_with_promo_code() {
        let submission = r#"{
            "kind": "order",
            "items": [
                { "source": { "type": "product", "productId": "550e8400-e29b-41d4-a716-446655440000" }, "quantity": 2, "unitPrice": "12.50" }
            ],
            "promoCode": "autumn",
            "claimed": { "subtotal": 2500, "discountAmount": 400, "taxableAmount": 2100, "taxAmount": 0, "total": 2100 }
        }"#;

        let verification =
            verify(submission, &catalog(), &PricingConfig::default(), now()).unwrap();
        // 20% of $25.00 is $5.00, capped at $4.00.
        assert!(verification.is_consistent());
        assert_eq!(verification.authoritative.total, Money::from_cents(2100));
    }

    #[test]
    fn test_verify_reports_tampering() {
        let submission = r#"{
            "kind": "quotation",
            "items": [
                { "source": { "type": "product", "productId": "550e8400-e29b-41d4-a716-446655440000" }, "quantity": 1, "unitPrice": "1.00" }
            ],
            "taxRate": "0",
            "claimed": { "subtotal": 100, "discountAmount": 0, "taxableAmount": 100, "taxAmount": 0, "total": 100 }
        }"#;

        let mut config = PricingConfig::default();
        config.pricing.tax_rate_bps = Some(800);

        let verification = verify(submission, &catalog(), &config, now()).unwrap();
        assert!(!verification.is_consistent());
        assert_eq!(verification.authoritative.total, Money::from_cents(1350));
        assert!(verification
            .discrepancies
            .iter()
            .any(|d| matches!(d, Discrepancy::TaxRate { .. })));
        assert!(verification
            .discrepancies
            .iter()
            .any(|d| matches!(d, Discrepancy::UnitPrice { index: 0, .. })));
    }

    #[test]
    fn test_verify_expired_promo_code() {
        let submission = r#"{
            "kind": "order",
            "items": [
                { "source": { "type": "product", "productId": "550e8400-e29b-41d4-a716-446655440000" }, "quantity": 1 }
            ],
            "promoCode": "AUTUMN"
        }"#;

        let december = Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap();
        let err = verify(submission, &catalog(), &PricingConfig::default(), december).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::PromoCodeExpired { .. })
        ));
    }

    #[test]
    fn test_load_catalog_rejects_invalid_prices() {
        let path = std::env::temp_dir().join(format!(
            "storefront-pricing-catalog-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, CATALOG.replace("\"12.50\"", "\"-12.50\"")).unwrap();

        let result = load_catalog(&path);
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("Invalid catalog"));
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InvalidCatalogPrice { .. })
        ));
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let err = load_catalog(Path::new("/nonexistent/catalog.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read catalog"));
    }
}
