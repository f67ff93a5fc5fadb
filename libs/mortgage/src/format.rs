//! Display formatting for dollar amounts

/// Format a dollar amount rounded to whole dollars, e.g. `$1,234`
///
/// Non-finite amounts render as `$0`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0".to_string();
    }

    let rounded = amount.round();
    let digits = group_thousands(&format!("{:.0}", rounded.abs()));

    if rounded < 0.0 {
        format!("-${}", digits)
    } else {
        format!("${}", digits)
    }
}

/// Format a monthly payment, e.g. `$1,234/mo`
pub fn format_monthly_payment(amount: f64) -> String {
    format!("{}/mo", format_currency(amount))
}

fn group_thousands(raw: &str) -> String {
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);

    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(1_234.0), "$1,234");
        assert_eq!(format_currency(650_000.0), "$650,000");
        assert_eq!(format_currency(1_234_567.89), "$1,234,568");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(-1_500.2), "-$1,500");
        assert_eq!(format_currency(-0.3), "$0");
    }

    #[test]
    fn test_format_currency_non_finite() {
        assert_eq!(format_currency(f64::NAN), "$0");
        assert_eq!(format_currency(f64::INFINITY), "$0");
    }

    #[test]
    fn test_format_currency_beyond_integer_range() {
        assert_eq!(format_currency(1e20), "$100,000,000,000,000,000,000");
        assert_eq!(format_currency(-2.5e19), "-$25,000,000,000,000,000,000");
    }

    #[test]
    fn test_format_monthly_payment() {
        assert_eq!(format_monthly_payment(1_837.09), "$1,837/mo");
    }
}
