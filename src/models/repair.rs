//! Repair model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{MaterialId, PersonId, RepairId};
use super::money::Money;
use super::payment::PaymentStatus;
use super::vat::VatRate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl RepairStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" | "progress" => Some(Self::InProgress),
            "completed" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::InProgress => write!(f, "In progress"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repair {
    pub id: RepairId,

    pub material_id: MaterialId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repairer_id: Option<PersonId>,

    /// Repair shop name when the repairer is not a known person
    #[serde(default)]
    pub repairer: String,

    pub description: String,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Cost before tax
    #[serde(default)]
    pub cost: Money,

    #[serde(default)]
    pub vat_rate: VatRate,

    #[serde(default)]
    pub status: RepairStatus,

    #[serde(default)]
    pub payment: PaymentStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Repair {
    pub fn new(material_id: MaterialId, description: impl Into<String>, start_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: RepairId::new(),
            material_id,
            repairer_id: None,
            repairer: String::new(),
            description: description.into(),
            start_date,
            end_date: None,
            cost: Money::zero(),
            vat_rate: VatRate::Standard,
            status: RepairStatus::Pending,
            payment: PaymentStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status != RepairStatus::Completed
    }

    pub fn complete(&mut self, date: NaiveDate) {
        self.status = RepairStatus::Completed;
        self.end_date = Some(date);
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.description.trim().is_empty() {
            return Err("Repair description cannot be empty".into());
        }
        if self.cost.is_negative() {
            return Err("Repair cost cannot be negative".into());
        }
        if self.end_date.is_some_and(|end| end < self.start_date) {
            return Err("Repair end date cannot be before the start date".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete() {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut repair = Repair::new(MaterialId::new(), "Charbons moteur", start);
        assert!(repair.is_active());

        repair.complete(NaiveDate::from_ymd_opt(2025, 4, 8).unwrap());
        assert!(!repair.is_active());
        assert!(repair.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut repair = Repair::new(MaterialId::new(), " ", start);
        assert!(repair.validate().is_err());

        repair.description = "Cordon".into();
        repair.end_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert!(repair.validate().is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(RepairStatus::parse("in-progress"), Some(RepairStatus::InProgress));
        assert_eq!(RepairStatus::parse("done"), Some(RepairStatus::Completed));
        assert_eq!(RepairStatus::parse("lost"), None);
    }
}
