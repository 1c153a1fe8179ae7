//! Material model
//!
//! A piece of equipment owned by the workshop that can be lent, rented out
//! or sent for repair. Its availability is derived from the loans, rentals
//! and repairs that reference it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::MaterialId;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialStatus {
    Available,
    Loaned,
    Rented,
    InRepair,
}

impl fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Loaned => write!(f, "Loaned"),
            Self::Rented => write!(f, "Rented"),
            Self::InRepair => write!(f, "In repair"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,

    pub name: String,

    #[serde(default)]
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,

    /// Purchase price before tax
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: MaterialId::new(),
            name: name.into(),
            category: String::new(),
            brand: None,
            serial_number: None,
            purchase_date: None,
            purchase_price: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), MaterialValidationError> {
        if self.name.trim().is_empty() {
            return Err(MaterialValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(MaterialValidationError::NameTooLong(self.name.len()));
        }

        if self.purchase_price.is_some_and(|p| p.is_negative()) {
            return Err(MaterialValidationError::NegativePrice);
        }

        Ok(())
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.serial_number {
            Some(serial) => write!(f, "{} (S/N {})", self.name, serial),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativePrice,
}

impl fmt::Display for MaterialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Material name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Material name too long ({} chars, max 100)", len),
            Self::NegativePrice => write!(f, "Purchase price cannot be negative"),
        }
    }
}

impl std::error::Error for MaterialValidationError {}
