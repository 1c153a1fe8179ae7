//! Pricing and accounting rules
//!
//! Pure functions with no storage access. Every intermediate amount is
//! rounded to the cent (half away from zero) before it feeds the next step,
//! so totals match what is displayed line by line.
//!
//! The discount policy is: compute the gross tax-included amount, take the
//! discount off that gross, then back out the tax-exclusive amount by
//! dividing by `1 + rate`.

pub mod calculator;
pub mod deposit;
pub mod margin;
pub mod schedule;

pub use calculator::{
    discount_amount, gross_excl_tax, gross_incl_tax, net_excl_tax_after_discount, net_incl_tax,
    price_excl_tax, price_incl_tax, tax_after_discount, tax_amount, transaction_totals,
    LinePricing, TransactionTotals,
};
pub use deposit::{settle_deposit, DepositSettlement};
pub use margin::{margin, margin_percent, MarginReport};
pub use schedule::{classify_payment, rental_days, DueStatus};
