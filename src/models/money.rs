//! Money type for representing currency amounts
//!
//! Amounts are stored in cents (i64). Pricing works in `Decimal` and converts
//! back through [`Money::from_decimal`], which applies the two-decimal
//! rounding rule used everywhere in the application.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A monetary amount in cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

/// Largest amount accepted from user input: one trillion, in cents
const MAX_INPUT_CENTS: i64 = 100_000_000_000_000;

/// Round to two decimals, half away from zero
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use materiel::models::Money;
    /// let amount = Money::from_cents(1050); // 10,50 €
    /// assert_eq!(amount.to_string(), "10,50 €");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from euros and cents
    pub const fn from_units(units: i64, cents: i64) -> Self {
        Self(units * 100 + cents)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole currency units (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// The cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Exact decimal value of this amount
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Round a decimal to two places and convert it to cents
    ///
    /// Values outside the i64 cent range saturate.
    pub fn from_decimal(value: Decimal) -> Self {
        let mut rounded = round2(value);
        rounded.rescale(2);
        let cents = rounded.mantissa().clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Self(cents)
    }

    /// Parse a money amount from user input
    ///
    /// Accepts "10,50", "10.50", "-10,50", "10,50 €", "€10.50" and "10".
    /// Amounts above one trillion are rejected as out of range.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let cleaned: String = s
            .trim()
            .trim_end_matches('€')
            .trim_start_matches('€')
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\u{202f}')
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        if cleaned.is_empty() {
            return Err(MoneyParseError::InvalidFormat(s.to_string()));
        }

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(MoneyParseError::InvalidFormat(s.to_string()));
        }

        let cents = match digits.split_once('.') {
            Some((units, fraction)) => {
                if fraction.contains('.') || fraction.len() > 2 {
                    return Err(MoneyParseError::InvalidFormat(s.to_string()));
                }
                let units: i64 = if units.is_empty() {
                    0
                } else {
                    units
                        .parse()
                        .map_err(|_| MoneyParseError::InvalidFormat(s.to_string()))?
                };
                let fraction: i64 = match fraction.len() {
                    0 => 0,
                    1 => {
                        fraction
                            .parse::<i64>()
                            .map_err(|_| MoneyParseError::InvalidFormat(s.to_string()))?
                            * 10
                    }
                    _ => fraction
                        .parse()
                        .map_err(|_| MoneyParseError::InvalidFormat(s.to_string()))?,
                };
                units
                    .checked_mul(100)
                    .and_then(|c| c.checked_add(fraction))
            }
            None => digits
                .parse::<i64>()
                .map_err(|_| MoneyParseError::InvalidFormat(s.to_string()))?
                .checked_mul(100),
        };

        match cents {
            Some(cents) if cents <= MAX_INPUT_CENTS => {
                Ok(Self(if negative { -cents } else { cents }))
            }
            _ => Err(MoneyParseError::OutOfRange(s.to_string())),
        }
    }

    /// Format with a trailing currency symbol and comma decimal separator
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        format!("{} {}", self.format_plain(), symbol)
    }

    /// Format with a comma decimal separator and no symbol ("-12,50")
    pub fn format_plain(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{},{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with_symbol("€"))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
    OutOfRange(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
            MoneyParseError::OutOfRange(s) => write!(f, "Amount out of range: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "10,50 €");
        assert_eq!(Money::from_cents(0).to_string(), "0,00 €");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10,50 €");
        assert_eq!(Money::from_cents(-5).to_string(), "-0,05 €");
        assert_eq!(Money::from_cents(5).format_with_symbol("CHF"), "0,05 CHF");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10,50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("10,50 €").unwrap().cents(), 1050);
        assert_eq!(Money::parse("€10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse("-3,2").unwrap().cents(), -320);
        assert_eq!(Money::parse("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse(",05").unwrap().cents(), 5);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("1,234").is_err());
        assert!(Money::parse("--5").is_err());
        assert!(Money::parse("1,-5").is_err());
        assert!(Money::parse("+5").is_err());
    }

    #[test]
    fn test_parse_huge_amount_is_an_error() {
        assert_eq!(
            Money::parse("999999999999999999"),
            Err(MoneyParseError::OutOfRange("999999999999999999".into()))
        );
        assert!(matches!(
            Money::parse("92233720368547758,07"),
            Err(MoneyParseError::OutOfRange(_))
        ));
        assert!(Money::parse("-99999999999999999999").is_err());
        assert_eq!(Money::parse("1000000000000").unwrap().cents(), MAX_INPUT_CENTS);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!((max + Money::from_cents(1)).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - Money::from_cents(1)).cents(), i64::MIN);
    }

    #[test]
    fn test_decimal_conversion() {
        let m = Money::from_cents(3240);
        assert_eq!(m.to_decimal(), Decimal::from_str("32.40").unwrap());
        assert_eq!(Money::from_decimal(Decimal::from_str("27.004").unwrap()).cents(), 2700);
        assert_eq!(Money::from_decimal(Decimal::from_str("0.125").unwrap()).cents(), 13);
        assert_eq!(Money::from_decimal(Decimal::from_str("-0.125").unwrap()).cents(), -13);
    }

    #[test]
    fn test_round2_midpoint_away_from_zero() {
        assert_eq!(round2(Decimal::from_str("1.005").unwrap()), Decimal::from_str("1.01").unwrap());
        assert_eq!(round2(Decimal::from_str("2.675").unwrap()), Decimal::from_str("2.68").unwrap());
        assert_eq!(round2(Decimal::from_str("2.674").unwrap()), Decimal::from_str("2.67").unwrap());
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);

        let total: Money = vec![a, b, Money::from_cents(1)].into_iter().sum();
        assert_eq!(total.cents(), 1501);
    }

    #[test]
    fn test_serialization() {
        let m = Money::from_cents(1050);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "1050");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
