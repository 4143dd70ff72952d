//! Plain-text rendering of pricing results for the terminal.

use storefront_core::submission::Verification;
use storefront_core::{Money, PricingResult, TaxRate};

const LABEL_WIDTH: usize = 16;
const AMOUNT_WIDTH: usize = 14;

fn push_row(out: &mut String, label: &str, amount: Money) {
    out.push_str(&format!(
        "{:<label$}{:>amount$}\n",
        label,
        amount.to_string(),
        label = LABEL_WIDTH,
        amount = AMOUNT_WIDTH
    ));
}

/// Renders a result as a right-aligned `$X.XX` table.
///
/// ```text
/// Subtotal                $25.50
/// Discount                -$2.55
/// Taxable                 $22.95
/// Tax (11%)                $2.52
/// Total                   $25.47
/// ```
pub fn render_summary(result: &PricingResult, tax_rate: TaxRate) -> String {
    let mut out = String::new();
    push_row(&mut out, "Subtotal", result.subtotal);
    if !result.discount_amount.is_zero() {
        push_row(&mut out, "Discount", -result.discount_amount);
        push_row(&mut out, "Taxable", result.taxable_amount);
    }
    push_row(&mut out, &format!("Tax ({})", tax_rate), result.tax_amount);
    push_row(&mut out, "Total", result.total);
    out
}

/// Renders the authoritative totals followed by every discrepancy found.
pub fn render_verification(verification: &Verification) -> String {
    let mut out = format!("Authoritative {} pricing\n", verification.kind);
    out.push_str(&render_summary(
        &verification.authoritative,
        verification.tax_rate,
    ));

    if verification.is_consistent() {
        out.push_str("\nSubmitted pricing matches.\n");
    } else {
        out.push_str(&format!(
            "\n{} discrepancies:\n",
            verification.discrepancies.len()
        ));
        for discrepancy in &verification.discrepancies {
            out.push_str(&format!("  - {}\n", discrepancy));
        }
    }
    out
}
