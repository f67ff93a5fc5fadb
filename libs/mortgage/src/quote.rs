//! Aggregated figures shown on listing cards and detail pages

use serde::Serialize;

use crate::amortization::{equity_needed, monthly_payment, total_interest};

/// Monthly payment at the market rate versus the assumable rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentComparison {
    pub market_rate: f64,
    pub assumable_rate: f64,
    pub term_years: u32,
    pub market_payment: f64,
    pub assumable_payment: f64,
    pub monthly_savings: f64,
}

impl PaymentComparison {
    /// Compare payments on `loan_balance` over `term_years`
    pub fn new(loan_balance: f64, assumable_rate: f64, market_rate: f64, term_years: u32) -> Self {
        let market_payment = monthly_payment(loan_balance, market_rate, term_years);
        let assumable_payment = monthly_payment(loan_balance, assumable_rate, term_years);

        Self {
            market_rate,
            assumable_rate,
            term_years,
            market_payment,
            assumable_payment,
            monthly_savings: market_payment - assumable_payment,
        }
    }

    /// Savings accumulated over the whole term
    pub fn lifetime_savings(&self) -> f64 {
        self.monthly_savings * f64::from(self.term_years) * 12.0
    }
}

/// Full economics of assuming a loan on a listing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoanQuote {
    pub sale_price: f64,
    pub loan_balance: f64,
    pub equity_needed: f64,
    #[serde(flatten)]
    pub comparison: PaymentComparison,
    pub total_interest_assumable: f64,
    pub total_interest_market: f64,
    pub lifetime_savings: f64,
}

impl LoanQuote {
    pub fn new(
        sale_price: f64,
        loan_balance: f64,
        assumable_rate: f64,
        market_rate: f64,
        term_years: u32,
    ) -> Self {
        let comparison = PaymentComparison::new(loan_balance, assumable_rate, market_rate, term_years);

        Self {
            sale_price,
            loan_balance,
            equity_needed: equity_needed(sale_price, loan_balance),
            comparison,
            total_interest_assumable: total_interest(loan_balance, assumable_rate, term_years),
            total_interest_market: total_interest(loan_balance, market_rate, term_years),
            lifetime_savings: comparison.lifetime_savings(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::{DEFAULT_MARKET_RATE, DEFAULT_TERM_YEARS, monthly_savings};

    #[test]
    fn test_comparison_matches_savings() {
        let comparison =
            PaymentComparison::new(450_000.0, 2.75, DEFAULT_MARKET_RATE, DEFAULT_TERM_YEARS);
        assert_eq!(
            comparison.monthly_savings,
            monthly_savings(450_000.0, 2.75, None)
        );
        assert_eq!(
            comparison.monthly_savings,
            comparison.market_payment - comparison.assumable_payment
        );
    }

    #[test]
    fn test_quote_for_seed_listing() {
        let quote = LoanQuote::new(650_000.0, 450_000.0, 2.75, 7.0, 30);
        assert_eq!(quote.equity_needed, 200_000.0);
        assert!(quote.total_interest_market > quote.total_interest_assumable);
        let interest_gap = quote.total_interest_market - quote.total_interest_assumable;
        assert!((interest_gap - quote.lifetime_savings).abs() < 1e-4);
    }

    #[test]
    fn test_quote_serializes_flat() {
        let quote = LoanQuote::new(400_000.0, 450_000.0, 3.0, 7.0, 30);
        let json = serde_json::to_value(quote).unwrap();
        assert_eq!(json["equity_needed"], 0.0);
        assert_eq!(json["term_years"], 30);
        assert!(json.get("comparison").is_none());
        assert!(json["monthly_savings"].as_f64().unwrap() > 0.0);
    }
}
