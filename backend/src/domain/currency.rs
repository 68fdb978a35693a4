//! Currency formatting and live-input parsing.
//!
//! Amounts are whole pesos; grouping uses the es-CL convention with a dot
//! every three digits. Live currency fields accumulate digits as whole-unit
//! amounts, so parsing strips everything that is not a digit.

/// Render a peso amount with locale grouping. `symbol = false` drops the
/// currency glyph but keeps the grouping.
pub fn format_currency(amount: f64, symbol: bool) -> String {
    let grouped = group_thousands(amount.round() as i64);
    if symbol {
        format!("${}", grouped)
    } else {
        grouped
    }
}

/// Parse a live-typed currency field. All non-digit characters are stripped
/// before parsing; anything unparseable yields 0.
pub fn parse_currency_input(text: &str) -> f64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<f64>().unwrap_or(0.0)
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_grouping_and_symbol() {
        assert_eq!(format_currency(1_000_000.0, true), "$1.000.000");
        assert_eq!(format_currency(150_000.0, true), "$150.000");
        assert_eq!(format_currency(999.0, true), "$999");
        assert_eq!(format_currency(0.0, true), "$0");
    }

    #[test]
    fn symbol_false_keeps_grouping() {
        assert_eq!(format_currency(1_234_567.0, false), "1.234.567");
        assert_eq!(format_currency(-50_000.0, false), "-50.000");
    }

    #[test]
    fn rounds_to_whole_pesos() {
        assert_eq!(format_currency(1499.6, true), "$1.500");
    }

    #[test]
    fn parses_digits_only() {
        assert_eq!(parse_currency_input("150000"), 150_000.0);
        assert_eq!(parse_currency_input("$150.000"), 150_000.0);
        assert_eq!(parse_currency_input("1,234,567"), 1_234_567.0);
        assert_eq!(parse_currency_input("monto: 500"), 500.0);
    }

    #[test]
    fn unparseable_defaults_to_zero() {
        assert_eq!(parse_currency_input(""), 0.0);
        assert_eq!(parse_currency_input("sin dígitos"), 0.0);
        assert_eq!(parse_currency_input("$."), 0.0);
    }
}
