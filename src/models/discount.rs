//! Discounts applied to the tax-included total of a sale or rental

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

/// A discount on a tax-included total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    /// Percentage of the gross TTC, between 0 and 100
    Percentage(Decimal),
    /// Fixed amount, clamped to the gross TTC when applied
    Fixed(Money),
}

impl Discount {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn validate(&self) -> Result<(), DiscountValidationError> {
        match self {
            Self::None => Ok(()),
            Self::Percentage(p) => {
                if *p < Decimal::ZERO || *p > Decimal::ONE_HUNDRED {
                    Err(DiscountValidationError::PercentageOutOfRange(*p))
                } else {
                    Ok(())
                }
            }
            Self::Fixed(amount) => {
                if amount.is_negative() {
                    Err(DiscountValidationError::NegativeAmount(*amount))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Parse "10%" as a percentage and "5,00" as a fixed amount
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s == "0" {
            return Some(Self::None);
        }

        if let Some(pct) = s.strip_suffix('%') {
            let pct: Decimal = pct.trim().replace(',', ".").parse().ok()?;
            return Some(Self::Percentage(pct));
        }

        Money::parse(s).ok().map(Self::Fixed)
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "-"),
            Self::Percentage(p) => write!(f, "{} %", p.normalize().to_string().replace('.', ",")),
            Self::Fixed(amount) => write!(f, "{}", amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountValidationError {
    PercentageOutOfRange(Decimal),
    NegativeAmount(Money),
}

impl fmt::Display for DiscountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PercentageOutOfRange(p) => {
                write!(f, "Discount percentage must be between 0 and 100 (got {})", p)
            }
            Self::NegativeAmount(m) => write!(f, "Discount amount cannot be negative ({})", m),
        }
    }
}

impl std::error::Error for DiscountValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Discount::parse(""), Some(Discount::None));
        assert_eq!(Discount::parse("10%"), Some(Discount::Percentage(Decimal::TEN)));
        assert_eq!(
            Discount::parse("2,5 %"),
            Some(Discount::Percentage(Decimal::new(25, 1)))
        );
        assert_eq!(
            Discount::parse("5,00"),
            Some(Discount::Fixed(Money::from_cents(500)))
        );
        assert_eq!(Discount::parse("x%"), None);
    }

    #[test]
    fn test_validate() {
        assert!(Discount::None.validate().is_ok());
        assert!(Discount::Percentage(Decimal::ONE_HUNDRED).validate().is_ok());
        assert!(Discount::Percentage(Decimal::new(1001, 1)).validate().is_err());
        assert!(Discount::Percentage(Decimal::NEGATIVE_ONE).validate().is_err());
        assert!(Discount::Fixed(Money::from_cents(-1)).validate().is_err());
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_string(&Discount::Fixed(Money::from_cents(360))).unwrap();
        assert_eq!(json, r#"{"kind":"fixed","value":360}"#);
        let json = serde_json::to_string(&Discount::None).unwrap();
        assert_eq!(json, r#"{"kind":"none"}"#);
    }
}
