//! Margins between sale and purchase amounts (both before tax)

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{round2, Money};

/// `sale_excl_tax - purchase_excl_tax`
pub fn margin(sale_excl_tax: Money, purchase_excl_tax: Money) -> Money {
    sale_excl_tax - purchase_excl_tax
}

/// `margin / purchase_excl_tax * 100`, rounded to two decimals
///
/// `None` when nothing was paid for the goods.
pub fn margin_percent(sale_excl_tax: Money, purchase_excl_tax: Money) -> Option<Decimal> {
    if purchase_excl_tax.is_zero() {
        return None;
    }
    let m = margin(sale_excl_tax, purchase_excl_tax).to_decimal();
    Some(round2(m / purchase_excl_tax.to_decimal() * Decimal::ONE_HUNDRED))
}

/// Margin summary for an article or a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarginReport {
    pub sales_excl_tax: Money,
    pub cost_excl_tax: Money,
    pub margin: Money,
    pub margin_percent: Option<Decimal>,
}

impl MarginReport {
    pub fn new(sales_excl_tax: Money, cost_excl_tax: Money) -> Self {
        Self {
            sales_excl_tax,
            cost_excl_tax,
            margin: margin(sales_excl_tax, cost_excl_tax),
            margin_percent: margin_percent(sales_excl_tax, cost_excl_tax),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_margin() {
        assert_eq!(
            margin(Money::from_cents(1500), Money::from_cents(1000)),
            Money::from_cents(500)
        );
        assert_eq!(
            margin(Money::from_cents(800), Money::from_cents(1000)),
            Money::from_cents(-200)
        );
    }

    #[test]
    fn test_margin_percent() {
        assert_eq!(
            margin_percent(Money::from_cents(1500), Money::from_cents(1000)),
            Some(Decimal::from(50))
        );
        assert_eq!(
            margin_percent(Money::from_cents(1000), Money::from_cents(300)),
            Some(Decimal::from_str("233.33").unwrap())
        );
        assert_eq!(
            margin_percent(Money::from_cents(800), Money::from_cents(1000)),
            Some(Decimal::from(-20))
        );
    }

    #[test]
    fn test_margin_percent_zero_purchase() {
        assert_eq!(margin_percent(Money::from_cents(1500), Money::zero()), None);
        let report = MarginReport::new(Money::from_cents(1500), Money::zero());
        assert_eq!(report.margin, Money::from_cents(1500));
        assert!(report.margin_percent.is_none());
    }
}
