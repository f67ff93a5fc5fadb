//! Mortgage arithmetic for VA loan assumptions
//!
//! This crate provides the pure, stateless loan calculations used across the
//! ValorHomes services: monthly payments on an amortizing loan, the savings a
//! buyer gets by assuming a low-rate loan instead of financing at market rate,
//! the equity a buyer must bring to closing, and the display formatting for
//! those figures.
//!
//! Every function maps degenerate input (non-positive principal, negative
//! rate, zero-length term) to a defined number instead of panicking.

pub mod amortization;
pub mod format;
pub mod quote;

pub use amortization::{
    DEFAULT_MARKET_RATE, DEFAULT_TERM_YEARS, equity_needed, monthly_payment, monthly_savings,
    total_interest,
};
pub use format::{format_currency, format_monthly_payment};
pub use quote::{LoanQuote, PaymentComparison};

/// Example usage of the calculator
///
/// ```rust
/// use mortgage::{monthly_payment, monthly_savings, format_monthly_payment};
///
/// let assumable = monthly_payment(450_000.0, 2.75, 30);
/// let savings = monthly_savings(450_000.0, 2.75, Some(7.0));
/// assert_eq!(format_monthly_payment(assumable), "$1,837/mo");
/// assert!(savings > 1_000.0);
/// ```
pub fn example_usage() {}
