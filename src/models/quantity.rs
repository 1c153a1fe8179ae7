//! Quantities: articles are sold either by unit or by weight, never both

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an article is sold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SoldBy {
    #[default]
    Unit,
    /// Sold by weight, in kilograms
    Weight,
}

impl SoldBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "unit" | "unite" | "unité" | "u" => Some(Self::Unit),
            "weight" | "poids" | "kg" => Some(Self::Weight),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Unit => "u",
            Self::Weight => "kg",
        }
    }
}

/// Largest quantity a line may carry: one billion units or kilograms
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// A line quantity: a unit count or a weight in kilograms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "amount", rename_all = "lowercase")]
pub enum Quantity {
    Units(Decimal),
    Weight(Decimal),
}

impl Quantity {
    /// Build a quantity matching the way an article is sold
    pub fn new(sold_by: SoldBy, amount: Decimal) -> Self {
        match sold_by {
            SoldBy::Unit => Self::Units(amount),
            SoldBy::Weight => Self::Weight(amount),
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Self::Units(n) | Self::Weight(n) => *n,
        }
    }

    pub fn sold_by(&self) -> SoldBy {
        match self {
            Self::Units(_) => SoldBy::Unit,
            Self::Weight(_) => SoldBy::Weight,
        }
    }

    /// A quantity must be strictly positive, and a unit count whole
    pub fn validate(&self) -> Result<(), String> {
        let amount = self.amount();
        if amount <= Decimal::ZERO {
            return Err(format!("Quantity must be positive (got {})", amount));
        }
        if amount > MAX_QUANTITY {
            return Err(format!("Quantity must not exceed {} (got {})", MAX_QUANTITY, amount));
        }
        if let Self::Units(n) = self {
            if n.fract() != Decimal::ZERO {
                return Err(format!("Unit quantity must be a whole number (got {})", n));
            }
        }
        Ok(())
    }

    /// Parse user input; accepts a comma as decimal separator
    pub fn parse(sold_by: SoldBy, s: &str) -> Option<Self> {
        let amount: Decimal = s.trim().replace(',', ".").parse().ok()?;
        Some(Self::new(sold_by, amount))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.amount().normalize().to_string().replace('.', ",");
        write!(f, "{} {}", amount, self.sold_by().suffix())
    }
}
