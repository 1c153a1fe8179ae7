//! Payment status of a sale, purchase or rental

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        paid_on: Option<NaiveDate>,
    },
    Unpaid {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        due_date: Option<NaiveDate>,
    },
}

impl PaymentStatus {
    pub fn paid_on(date: NaiveDate) -> Self {
        Self::Paid {
            paid_on: Some(date),
        }
    }

    pub fn unpaid(due_date: Option<NaiveDate>) -> Self {
        Self::Unpaid { due_date }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid { .. })
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Paid { .. } => None,
            Self::Unpaid { due_date } => *due_date,
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Paid { paid_on: None }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paid { .. } => write!(f, "Paid"),
            Self::Unpaid { due_date: Some(d) } => write!(f, "Unpaid (due {})", d),
            Self::Unpaid { due_date: None } => write!(f, "Unpaid"),
        }
    }
}
