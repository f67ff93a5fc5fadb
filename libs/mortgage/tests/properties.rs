//! Cross-function properties of the mortgage calculator

use mortgage::{
    DEFAULT_TERM_YEARS, equity_needed, format_monthly_payment, monthly_payment, monthly_savings,
    total_interest,
};

const BALANCES: [f64; 5] = [50_000.0, 120_000.0, 325_000.0, 450_000.0, 1_250_000.0];
const RATES: [f64; 6] = [0.0, 2.5, 2.75, 3.25, 7.0, 12.0];

#[test]
fn test_savings_is_difference_of_payments() {
    for balance in BALANCES {
        for assumable in RATES {
            for market in RATES {
                let expected = monthly_payment(balance, market, DEFAULT_TERM_YEARS)
                    - monthly_payment(balance, assumable, DEFAULT_TERM_YEARS);
                assert_eq!(monthly_savings(balance, assumable, Some(market)), expected);
            }
        }
    }
}

#[test]
fn test_total_interest_recomputes_from_payment() {
    for balance in BALANCES {
        for rate in RATES {
            for years in [10, 15, 30] {
                let payment = monthly_payment(balance, rate, years);
                let interest = total_interest(balance, rate, years);
                assert!((interest - (payment * f64::from(years) * 12.0 - balance)).abs() < 1e-6);
                assert!(interest >= -1e-6, "interest should never be negative");
            }
        }
    }
}

#[test]
fn test_payment_grows_with_rate() {
    for balance in BALANCES {
        let payments: Vec<f64> = RATES
            .iter()
            .map(|rate| monthly_payment(balance, *rate, DEFAULT_TERM_YEARS))
            .collect();
        assert!(payments.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn test_payment_repays_principal() {
    // With a zero rate the payments add up to exactly the principal.
    for balance in BALANCES {
        let paid = monthly_payment(balance, 0.0, DEFAULT_TERM_YEARS) * 360.0;
        assert!((paid - balance).abs() < 1e-6);
    }
}

#[test]
fn test_equity_needed_never_negative() {
    for price in BALANCES {
        for balance in BALANCES {
            let equity = equity_needed(price, balance);
            assert!(equity >= 0.0);
            assert!(equity <= price);
        }
    }
}

#[test]
fn test_listing_card_figures() {
    // 123 Oak Street: $650k sale, $450k assumable at 2.75%.
    assert_eq!(
        format_monthly_payment(monthly_payment(450_000.0, 7.0, DEFAULT_TERM_YEARS)),
        "$2,994/mo"
    );
    assert_eq!(
        format_monthly_payment(monthly_payment(450_000.0, 2.75, DEFAULT_TERM_YEARS)),
        "$1,837/mo"
    );
    assert_eq!(
        format_monthly_payment(monthly_savings(450_000.0, 2.75, None)),
        "$1,157/mo"
    );
}
