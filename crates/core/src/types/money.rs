//! Money helpers using decimal arithmetic.
//!
//! The backend prices everything in a single currency, so amounts are plain
//! `Decimal`s. Floating point is never used for totals.

use rust_decimal::Decimal;

/// Price of a line: `unit_price × quantity`.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Format an amount for display, e.g. `$29.97`.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_is_exact() {
        assert_eq!(line_total(Decimal::new(999, 2), 3), Decimal::new(2997, 2));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(2997, 2)), "$29.97");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
        assert_eq!(format_money(Decimal::new(5, 0)), "$5.00");
    }
}
