//! Commerce transaction model
//!
//! A purchase from a supplier or a sale to a customer, made of one or more
//! priced lines, an optional discount on the tax-included total and a
//! payment status.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::discount::Discount;
use super::ids::{ArticleId, PersonId, TransactionId};
use super::money::Money;
use super::payment::PaymentStatus;
use super::quantity::Quantity;
use super::vat::VatRate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Purchase,
    Sale,
}

impl TransactionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "purchase" | "achat" | "buy" => Some(Self::Purchase),
            "sale" | "vente" | "sell" => Some(Self::Sale),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchase => write!(f, "Purchase"),
            Self::Sale => write!(f, "Sale"),
        }
    }
}

/// One priced line of a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLine {
    /// Article this line moves in or out of stock, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_id: Option<ArticleId>,

    /// Label printed on the line (the article name at the time of the sale)
    pub label: String,

    /// Unit price before tax (per unit or per kilogram)
    pub unit_price: Money,

    pub quantity: Quantity,

    pub vat_rate: VatRate,
}

impl TransactionLine {
    pub fn new(
        label: impl Into<String>,
        unit_price: Money,
        quantity: Quantity,
        vat_rate: VatRate,
    ) -> Self {
        Self {
            article_id: None,
            label: label.into(),
            unit_price,
            quantity,
            vat_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    pub kind: TransactionKind,

    pub date: NaiveDate,

    /// Customer or supplier, when known as a person
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<PersonId>,

    /// Free-text counterparty name (kept for display even if person_id is set)
    #[serde(default)]
    pub counterparty: String,

    pub lines: Vec<TransactionLine>,

    #[serde(default)]
    pub discount: Discount,

    #[serde(default)]
    pub payment: PaymentStatus,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(kind: TransactionKind, date: NaiveDate, lines: Vec<TransactionLine>) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            kind,
            date,
            person_id: None,
            counterparty: String::new(),
            lines,
            discount: Discount::None,
            payment: PaymentStatus::default(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_sale(&self) -> bool {
        self.kind == TransactionKind::Sale
    }

    pub fn mark_paid(&mut self, date: NaiveDate) {
        self.payment = PaymentStatus::paid_on(date);
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.lines.is_empty() {
            return Err(TransactionValidationError::NoLines);
        }

        for (index, line) in self.lines.iter().enumerate() {
            if line.label.trim().is_empty() {
                return Err(TransactionValidationError::EmptyLabel(index + 1));
            }
            if line.unit_price.is_negative() {
                return Err(TransactionValidationError::NegativePrice(index + 1));
            }
            line.quantity
                .validate()
                .map_err(|reason| TransactionValidationError::InvalidQuantity(index + 1, reason))?;
        }

        self.discount
            .validate()
            .map_err(|e| TransactionValidationError::InvalidDiscount(e.to_string()))?;

        if let Some(due) = self.payment.due_date() {
            if due < self.date {
                return Err(TransactionValidationError::DueBeforeDate);
            }
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({} lines)", self.kind, self.date, self.lines.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NoLines,
    EmptyLabel(usize),
    NegativePrice(usize),
    InvalidQuantity(usize, String),
    InvalidDiscount(String),
    DueBeforeDate,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLines => write!(f, "A transaction needs at least one line"),
            Self::EmptyLabel(n) => write!(f, "Line {}: label cannot be empty", n),
            Self::NegativePrice(n) => write!(f, "Line {}: unit price cannot be negative", n),
            Self::InvalidQuantity(n, reason) => write!(f, "Line {}: {}", n, reason),
            Self::InvalidDiscount(reason) => write!(f, "{}", reason),
            Self::DueBeforeDate => write!(f, "Due date cannot be before the transaction date"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line() -> TransactionLine {
        TransactionLine::new(
            "Marteau",
            Money::from_cents(1000),
            Quantity::Units(Decimal::from(3)),
            VatRate::Standard,
        )
    }

    #[test]
    fn test_validation() {
        let txn = Transaction::new(TransactionKind::Sale, date(2025, 1, 10), vec![line()]);
        assert!(txn.validate().is_ok());

        let empty = Transaction::new(TransactionKind::Sale, date(2025, 1, 10), vec![]);
        assert_eq!(empty.validate(), Err(TransactionValidationError::NoLines));

        let mut bad_qty = line();
        bad_qty.quantity = Quantity::Weight(Decimal::ZERO);
        let txn = Transaction::new(TransactionKind::Purchase, date(2025, 1, 10), vec![bad_qty]);
        assert!(matches!(
            txn.validate(),
            Err(TransactionValidationError::InvalidQuantity(1, _))
        ));
    }

    #[test]
    fn test_due_date_before_transaction_rejected() {
        let mut txn = Transaction::new(TransactionKind::Sale, date(2025, 1, 10), vec![line()]);
        txn.payment = PaymentStatus::unpaid(Some(date(2025, 1, 9)));
        assert_eq!(txn.validate(), Err(TransactionValidationError::DueBeforeDate));
    }

    #[test]
    fn test_mark_paid() {
        let mut txn = Transaction::new(TransactionKind::Sale, date(2025, 1, 10), vec![line()]);
        txn.payment = PaymentStatus::unpaid(Some(date(2025, 2, 10)));
        txn.mark_paid(date(2025, 2, 1));
        assert!(txn.payment.is_paid());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(TransactionKind::parse("vente"), Some(TransactionKind::Sale));
        assert_eq!(TransactionKind::parse("Purchase"), Some(TransactionKind::Purchase));
        assert_eq!(TransactionKind::parse("loan"), None);
    }
}
