//! VAT rates
//!
//! The application works with the French rate set. Rates are stored by name
//! so a change in the percentage does not rewrite historic transactions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// VAT rate applicable to an article, a rental or a repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VatRate {
    /// 0 %
    Zero,
    /// 2.1 % (press, some medicines)
    SuperReduced,
    /// 5.5 % (food, books)
    Reduced,
    /// 10 % (restaurants, renovation work)
    Intermediate,
    /// 20 %
    #[default]
    Standard,
}

impl VatRate {
    pub fn all() -> &'static [VatRate] {
        &[
            Self::Zero,
            Self::SuperReduced,
            Self::Reduced,
            Self::Intermediate,
            Self::Standard,
        ]
    }

    /// The rate as a fraction (0.2 for 20 %)
    pub fn rate(&self) -> Decimal {
        match self {
            Self::Zero => Decimal::ZERO,
            Self::SuperReduced => Decimal::new(21, 3),
            Self::Reduced => Decimal::new(55, 3),
            Self::Intermediate => Decimal::new(10, 2),
            Self::Standard => Decimal::new(20, 2),
        }
    }

    /// The rate as a percentage (20 for 20 %)
    pub fn percent(&self) -> Decimal {
        (self.rate() * Decimal::ONE_HUNDRED).normalize()
    }

    /// Parse "20", "20%", "5,5", "5.5 %" or a rate name
    pub fn parse(s: &str) -> Option<Self> {
        let cleaned: String = s
            .trim()
            .trim_end_matches('%')
            .trim()
            .replace(',', ".")
            .to_lowercase();

        match cleaned.as_str() {
            "0" | "0.0" | "zero" => Some(Self::Zero),
            "2.1" | "super_reduced" => Some(Self::SuperReduced),
            "5.5" | "reduced" => Some(Self::Reduced),
            "10" | "10.0" | "intermediate" => Some(Self::Intermediate),
            "20" | "20.0" | "standard" => Some(Self::Standard),
            _ => None,
        }
    }
}

impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} %", self.percent().to_string().replace('.', ","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rates() {
        assert_eq!(VatRate::Zero.rate(), Decimal::ZERO);
        assert_eq!(VatRate::Reduced.rate(), Decimal::from_str("0.055").unwrap());
        assert_eq!(VatRate::Standard.rate(), Decimal::from_str("0.2").unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(VatRate::Standard.to_string(), "20 %");
        assert_eq!(VatRate::Reduced.to_string(), "5,5 %");
        assert_eq!(VatRate::SuperReduced.to_string(), "2,1 %");
        assert_eq!(VatRate::Zero.to_string(), "0 %");
    }

    #[test]
    fn test_parse() {
        assert_eq!(VatRate::parse("20"), Some(VatRate::Standard));
        assert_eq!(VatRate::parse("20%"), Some(VatRate::Standard));
        assert_eq!(VatRate::parse("5,5 %"), Some(VatRate::Reduced));
        assert_eq!(VatRate::parse("10"), Some(VatRate::Intermediate));
        assert_eq!(VatRate::parse("reduced"), Some(VatRate::Reduced));
        assert_eq!(VatRate::parse("19.6"), None);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&VatRate::SuperReduced).unwrap();
        assert_eq!(json, "\"super_reduced\"");
    }
}
