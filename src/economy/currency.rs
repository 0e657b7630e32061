/// Display formatting for idle-game magnitudes.
use super::types::CurrencyKind;

// ============================================================================
// Display Formatting
// ============================================================================

const SUFFIXES: [(f64, &str); 5] = [
    (1e15, "Qa"),
    (1e12, "T"),
    (1e9, "B"),
    (1e6, "M"),
    (1e3, "K"),
];

/// Format an amount compactly: `999`, `1.50K`, `2.35M`, `7.00B`, `1.00T`, `3.10Qa`,
/// then scientific notation from 1e18 upward.
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return "∞".to_string();
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    if abs >= 1e18 {
        return format!("{}{:.2e}", sign, abs);
    }
    for (scale, suffix) in SUFFIXES {
        if abs >= scale {
            // Truncate rather than round so 999_999 never displays as "1000.00K".
            let scaled = (abs / scale * 100.0).floor() / 100.0;
            return format!("{}{:.2}{}", sign, scaled, suffix);
        }
    }
    format!("{}{}", sign, abs.floor())
}

/// Format an amount with its currency label, e.g. `"1.50K money"`.
pub fn format_currency(amount: f64, kind: CurrencyKind) -> String {
    format!("{} {}", format_amount(amount), kind.label())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_amounts() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(7.9), "7");
        assert_eq!(format_amount(999.0), "999");
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(format_amount(1_500.0), "1.50K");
        assert_eq!(format_amount(2_350_000.0), "2.35M");
        assert_eq!(format_amount(7e9), "7.00B");
        assert_eq!(format_amount(1e12), "1.00T");
        assert_eq!(format_amount(999_999.0), "999.99K");
    }

    #[test]
    fn test_scientific_and_sign() {
        assert_eq!(format_amount(2.5e20), "2.50e20");
        assert_eq!(format_amount(-1_500.0), "-1.50K");
        assert_eq!(format_amount(f64::INFINITY), "∞");
    }

    #[test]
    fn test_currency_label() {
        assert_eq!(format_currency(12.0, CurrencyKind::DarkMatter), "12 dark matter");
    }
}
