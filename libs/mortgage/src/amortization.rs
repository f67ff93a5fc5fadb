//! Closed-form amortization formulas

/// Loan term used when a caller has no better value (30-year fixed)
pub const DEFAULT_TERM_YEARS: u32 = 30;

/// Reference market rate, as a percentage, used when no market rate is supplied
pub const DEFAULT_MARKET_RATE: f64 = 7.0;

/// Calculate the monthly payment of a fixed-rate amortizing loan
///
/// Uses `P * r * (1+r)^n / ((1+r)^n - 1)` where `r` is the monthly rate and
/// `n` the number of monthly payments.
///
/// # Arguments
/// * `principal` - Loan amount
/// * `annual_rate` - Annual interest rate as a percentage (5.5 means 5.5%)
/// * `years` - Loan term in years
///
/// # Returns
/// * `0.0` when `principal <= 0`, `annual_rate < 0` or `years == 0`
/// * `principal / n` when the rate is zero
pub fn monthly_payment(principal: f64, annual_rate: f64, years: u32) -> f64 {
    if principal.is_nan() || principal <= 0.0 || annual_rate.is_nan() || annual_rate < 0.0 {
        return 0.0;
    }
    if years == 0 {
        return 0.0;
    }

    let monthly_rate = annual_rate / 100.0 / 12.0;
    let num_payments = f64::from(years) * 12.0;

    if monthly_rate == 0.0 {
        return principal / num_payments;
    }

    let growth = (1.0 + monthly_rate).powf(num_payments);
    // Very long terms converge to interest-only
    if growth.is_infinite() {
        return principal * monthly_rate;
    }
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Calculate the monthly savings of assuming a loan instead of borrowing at market rate
///
/// Both payments use the default 30-year term. When `market_rate` is `None`
/// the [`DEFAULT_MARKET_RATE`] is used.
pub fn monthly_savings(loan_balance: f64, assumable_rate: f64, market_rate: Option<f64>) -> f64 {
    let market_rate = market_rate.unwrap_or(DEFAULT_MARKET_RATE);
    let market_payment = monthly_payment(loan_balance, market_rate, DEFAULT_TERM_YEARS);
    let assumable_payment = monthly_payment(loan_balance, assumable_rate, DEFAULT_TERM_YEARS);
    market_payment - assumable_payment
}

/// Calculate the total interest paid over the life of the loan
pub fn total_interest(principal: f64, annual_rate: f64, years: u32) -> f64 {
    let payment = monthly_payment(principal, annual_rate, years);
    payment * f64::from(years) * 12.0 - principal
}

/// Calculate the cash a buyer must cover between the sale price and the assumed balance
///
/// Never negative: a loan balance above the sale price needs no equity.
pub fn equity_needed(sale_price: f64, loan_balance: f64) -> f64 {
    (sale_price - loan_balance).max(0.0)
}
