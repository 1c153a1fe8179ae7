//! Rental model
//!
//! A paid rental of a material, priced per day, usually secured by a
//! refundable deposit (caution).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::discount::Discount;
use super::ids::{MaterialId, PersonId, RentalId};
use super::money::Money;
use super::payment::PaymentStatus;
use super::vat::VatRate;

/// What happened to the deposit once the material came back
///
/// `FullyReturned` and any form of retention are mutually exclusive by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "outcome", content = "retained", rename_all = "snake_case")]
pub enum DepositOutcome {
    /// Material not returned yet, deposit still held
    #[default]
    Pending,
    FullyReturned,
    FullyRetained,
    /// Part of the deposit kept (damage, cleaning, late return)
    PartiallyRetained(Money),
}

impl DepositOutcome {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for DepositOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Held"),
            Self::FullyReturned => write!(f, "Returned"),
            Self::FullyRetained => write!(f, "Retained"),
            Self::PartiallyRetained(amount) => write!(f, "Partially retained ({})", amount),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rental {
    pub id: RentalId,

    pub material_id: MaterialId,

    pub person_id: PersonId,

    pub start_date: NaiveDate,

    /// Last rented day (inclusive)
    pub end_date: NaiveDate,

    /// Price per day before tax
    pub daily_rate: Money,

    pub vat_rate: VatRate,

    #[serde(default)]
    pub discount: Discount,

    /// Deposit amount requested from the renter
    #[serde(default)]
    pub deposit: Money,

    #[serde(default)]
    pub deposit_outcome: DepositOutcome,

    #[serde(default)]
    pub payment: PaymentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returned_on: Option<NaiveDate>,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Rental {
    pub fn new(
        material_id: MaterialId,
        person_id: PersonId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        daily_rate: Money,
        vat_rate: VatRate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RentalId::new(),
            material_id,
            person_id,
            start_date,
            end_date,
            daily_rate,
            vat_rate,
            discount: Discount::None,
            deposit: Money::zero(),
            deposit_outcome: DepositOutcome::Pending,
            payment: PaymentStatus::default(),
            returned_on: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.returned_on.is_none()
    }

    /// Still out after the last rented day
    pub fn is_late(&self, today: NaiveDate) -> bool {
        self.is_active() && self.end_date < today
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.end_date < self.start_date {
            return Err("Rental end date cannot be before the start date".into());
        }
        if self.daily_rate.is_negative() {
            return Err("Daily rate cannot be negative".into());
        }
        if self.deposit.is_negative() {
            return Err("Deposit cannot be negative".into());
        }
        self.discount.validate().map_err(|e| e.to_string())?;
        Ok(())
    }
}
