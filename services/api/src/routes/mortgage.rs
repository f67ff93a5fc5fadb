//! Standalone mortgage calculator

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use mortgage::{LoanQuote, format_currency, format_monthly_payment};
use serde::{Deserialize, Serialize};

use crate::{
    config::MortgageConfig,
    error::{ApiError, ApiResult},
    extractors::AppQuery,
    state::AppState,
};

const MAX_AMOUNT: f64 = 1_000_000_000_000.0;
const MAX_RATE: f64 = 25.0;
const MAX_TERM_YEARS: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub loan_balance: f64,
    pub assumable_rate: f64,
    pub market_rate: Option<f64>,
    pub sale_price: Option<f64>,
    pub years: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct QuoteDisplay {
    pub assumable_payment: String,
    pub market_payment: String,
    pub monthly_savings: String,
    pub equity_needed: String,
    pub lifetime_savings: String,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: LoanQuote,
    pub display: QuoteDisplay,
}

fn check_amount(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && (0.0..=MAX_AMOUNT).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} must be between 0 and {}.", name, MAX_AMOUNT))
    }
}

fn check_rate(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && (0.0..=MAX_RATE).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} must be between 0 and {}.", name, MAX_RATE))
    }
}

impl QuoteQuery {
    /// Fill defaults from `config` and validate every input
    pub fn quote(&self, config: &MortgageConfig) -> Result<LoanQuote, String> {
        let market_rate = self.market_rate.unwrap_or(config.market_rate);
        let sale_price = self.sale_price.unwrap_or(self.loan_balance);
        let years = self.years.unwrap_or(config.term_years);

        check_amount("loan_balance", self.loan_balance)?;
        check_amount("sale_price", sale_price)?;
        check_rate("assumable_rate", self.assumable_rate)?;
        check_rate("market_rate", market_rate)?;
        if !(1..=MAX_TERM_YEARS).contains(&years) {
            return Err(format!("years must be between 1 and {}.", MAX_TERM_YEARS));
        }

        Ok(LoanQuote::new(
            sale_price,
            self.loan_balance,
            self.assumable_rate,
            market_rate,
            years,
        ))
    }
}

impl From<LoanQuote> for QuoteResponse {
    fn from(quote: LoanQuote) -> Self {
        let display = QuoteDisplay {
            assumable_payment: format_monthly_payment(quote.comparison.assumable_payment),
            market_payment: format_monthly_payment(quote.comparison.market_payment),
            monthly_savings: format_monthly_payment(quote.comparison.monthly_savings),
            equity_needed: format_currency(quote.equity_needed),
            lifetime_savings: format_currency(quote.lifetime_savings),
        };

        Self { quote, display }
    }
}

pub async fn get_quote(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<QuoteQuery>,
) -> ApiResult<impl IntoResponse> {
    let quote = query.quote(&state.mortgage).map_err(ApiError::BadRequest)?;
    Ok(Json(QuoteResponse::from(quote)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MortgageConfig {
        MortgageConfig {
            market_rate: 7.0,
            term_years: 30,
        }
    }

    fn query(loan_balance: f64, assumable_rate: f64) -> QuoteQuery {
        QuoteQuery {
            loan_balance,
            assumable_rate,
            market_rate: None,
            sale_price: None,
            years: None,
        }
    }

    #[test]
    fn test_defaults_from_config() {
        let quote = query(450_000.0, 2.75).quote(&config()).unwrap();
        assert_eq!(quote.comparison.market_rate, 7.0);
        assert_eq!(quote.comparison.term_years, 30);
        assert_eq!(quote.sale_price, 450_000.0);
        assert_eq!(quote.equity_needed, 0.0);
    }

    #[test]
    fn test_display_strings() {
        let mut q = query(450_000.0, 2.75);
        q.sale_price = Some(650_000.0);
        let response = QuoteResponse::from(q.quote(&config()).unwrap());

        assert_eq!(response.display.assumable_payment, "$1,837/mo");
        assert_eq!(response.display.equity_needed, "$200,000");
    }

    #[test]
    fn test_rejects_bad_input() {
        let config = config();
        assert!(query(-1.0, 2.75).quote(&config).is_err());
        assert!(query(f64::NAN, 2.75).quote(&config).is_err());
        assert!(query(450_000.0, 30.0).quote(&config).is_err());
        assert!(query(1e20, 2.75).quote(&config).is_err());

        let mut q = query(450_000.0, 2.75);
        q.years = Some(0);
        assert!(q.quote(&config).is_err());

        q.years = Some(15);
        assert_eq!(q.quote(&config).unwrap().comparison.term_years, 15);
    }
}
