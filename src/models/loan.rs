//! Loan model
//!
//! A free loan of a material to a person.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{LoanId, MaterialId, PersonId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,

    pub material_id: MaterialId,

    pub person_id: PersonId,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_return: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returned_on: Option<NaiveDate>,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn new(material_id: MaterialId, person_id: PersonId, start_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: LoanId::new(),
            material_id,
            person_id,
            start_date,
            expected_return: None,
            returned_on: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.returned_on.is_none()
    }

    /// Not returned and the expected return date is already past
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && self.expected_return.is_some_and(|d| d < today)
    }

    pub fn mark_returned(&mut self, date: NaiveDate) {
        self.returned_on = Some(date);
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(expected) = self.expected_return {
            if expected < self.start_date {
                return Err("Expected return date cannot be before the start date".into());
            }
        }
        if let Some(returned) = self.returned_on {
            if returned < self.start_date {
                return Err("Return date cannot be before the start date".into());
            }
        }
        Ok(())
    }
}
