//! Due dates and rental durations

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::models::PaymentStatus;

/// Where an unpaid amount stands relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DueStatus {
    Overdue,
    DueToday,
    Upcoming,
    /// Paid, or unpaid without a due date
    NotApplicable,
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue => write!(f, "Overdue"),
            Self::DueToday => write!(f, "Due today"),
            Self::Upcoming => write!(f, "Upcoming"),
            Self::NotApplicable => write!(f, "-"),
        }
    }
}

/// Classify a payment against `today`
///
/// Due dates carry no time of day and count as the end of their day: a due
/// date strictly before today is overdue, today's is due today.
pub fn classify_payment(payment: &PaymentStatus, today: NaiveDate) -> DueStatus {
    match payment.due_date() {
        None => DueStatus::NotApplicable,
        Some(due) if due < today => DueStatus::Overdue,
        Some(due) if due == today => DueStatus::DueToday,
        Some(_) => DueStatus::Upcoming,
    }
}

/// Number of rented days, both ends included, never less than one
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn test_classify() {
        let today = date(15);
        assert_eq!(
            classify_payment(&PaymentStatus::unpaid(Some(date(14))), today),
            DueStatus::Overdue
        );
        assert_eq!(
            classify_payment(&PaymentStatus::unpaid(Some(date(15))), today),
            DueStatus::DueToday
        );
        assert_eq!(
            classify_payment(&PaymentStatus::unpaid(Some(date(16))), today),
            DueStatus::Upcoming
        );
        assert_eq!(
            classify_payment(&PaymentStatus::unpaid(None), today),
            DueStatus::NotApplicable
        );
        assert_eq!(
            classify_payment(&PaymentStatus::paid_on(date(1)), today),
            DueStatus::NotApplicable
        );
    }

    #[test]
    fn test_rental_days() {
        assert_eq!(rental_days(date(1), date(1)), 1);
        assert_eq!(rental_days(date(1), date(3)), 3);
        assert_eq!(rental_days(date(3), date(1)), 1);
    }
}
