//! Article model
//!
//! An article is something bought and sold: a stock item with purchase and
//! sale prices before tax, a VAT rate and a stock level.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ArticleId;
use super::money::Money;
use super::quantity::SoldBy;
use super::vat::VatRate;
use crate::pricing::gross_excl_tax;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,

    pub name: String,

    /// Free-form category ("Outillage", "Quincaillerie", ...)
    #[serde(default)]
    pub category: String,

    /// Supplier or internal reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Purchase price before tax, per unit or per kilogram
    pub purchase_price: Money,

    /// Sale price before tax, per unit or per kilogram
    pub sale_price: Money,

    pub vat_rate: VatRate,

    pub sold_by: SoldBy,

    /// Units or kilograms in stock
    #[serde(default)]
    pub stock: Decimal,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub archived: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn new(
        name: impl Into<String>,
        purchase_price: Money,
        sale_price: Money,
        vat_rate: VatRate,
        sold_by: SoldBy,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ArticleId::new(),
            name: name.into(),
            category: String::new(),
            reference: None,
            purchase_price,
            sale_price,
            vat_rate,
            sold_by,
            stock: Decimal::ZERO,
            notes: String::new(),
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stock valued at purchase price before tax
    pub fn stock_value(&self) -> Money {
        if self.stock <= Decimal::ZERO {
            return Money::zero();
        }
        gross_excl_tax(self.purchase_price, self.stock)
    }

    pub fn archive(&mut self) {
        self.archived = true;
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if self.name.trim().is_empty() {
            return Err(ArticleValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(ArticleValidationError::NameTooLong(self.name.len()));
        }

        if self.purchase_price.is_negative() || self.sale_price.is_negative() {
            return Err(ArticleValidationError::NegativePrice);
        }

        if self.sold_by == SoldBy::Unit && self.stock.fract() != Decimal::ZERO {
            return Err(ArticleValidationError::FractionalUnitStock(self.stock));
        }

        Ok(())
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} HT / {})", self.name, self.sale_price, self.sold_by.suffix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativePrice,
    FractionalUnitStock(Decimal),
}

impl fmt::Display for ArticleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Article name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Article name too long ({} chars, max 100)", len),
            Self::NegativePrice => write!(f, "Prices cannot be negative"),
            Self::FractionalUnitStock(s) => {
                write!(f, "Stock of an article sold by unit must be whole (got {})", s)
            }
        }
    }
}

impl std::error::Error for ArticleValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Article {
        Article::new(
            "Vis inox 4x40",
            Money::from_cents(800),
            Money::from_cents(1000),
            VatRate::Standard,
            SoldBy::Unit,
        )
    }

    #[test]
    fn test_new_article() {
        let article = sample();
        assert_eq!(article.stock, Decimal::ZERO);
        assert!(!article.archived);
        assert!(article.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut article = sample();
        article.name = "  ".into();
        assert_eq!(article.validate(), Err(ArticleValidationError::EmptyName));

        let mut article = sample();
        article.sale_price = Money::from_cents(-1);
        assert_eq!(article.validate(), Err(ArticleValidationError::NegativePrice));

        let mut article = sample();
        article.stock = Decimal::new(15, 1);
        assert!(matches!(
            article.validate(),
            Err(ArticleValidationError::FractionalUnitStock(_))
        ));

        article.sold_by = SoldBy::Weight;
        assert!(article.validate().is_ok());
    }

    #[test]
    fn test_stock_value() {
        let mut article = sample();
        article.stock = Decimal::from(12);
        assert_eq!(article.stock_value().cents(), 9600);

        article.stock = Decimal::NEGATIVE_ONE;
        assert_eq!(article.stock_value(), Money::zero());
    }

    #[test]
    fn test_serialization() {
        let article = sample();
        let json = serde_json::to_string(&article).unwrap();
        let back: Article = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, article.id);
        assert_eq!(back.sold_by, SoldBy::Unit);
    }
}
