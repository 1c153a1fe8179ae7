//! Loan service
//!
//! Free loans of equipment to a person, with an expected return date.

use chrono::{Duration, NaiveDate, Utc};

use crate::error::{MaterielError, MaterielResult};
use crate::models::{Loan, LoanId, MaterialId, PersonId};
use crate::storage::Storage;

use super::material::MaterialService;

pub struct LoanService<'a> {
    storage: &'a Storage,
}

impl<'a> LoanService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Lend an available material to a known person
    pub fn create(
        &self,
        material_id: MaterialId,
        person_id: PersonId,
        start_date: NaiveDate,
        expected_return: Option<NaiveDate>,
        notes: impl Into<String>,
    ) -> MaterielResult<Loan> {
        MaterialService::new(self.storage).ensure_available(material_id)?;
        self.storage.persons.require(person_id)?;

        let mut loan = Loan::new(material_id, person_id, start_date);
        loan.expected_return = expected_return;
        loan.notes = notes.into();
        loan.validate().map_err(MaterielError::Validation)?;

        self.storage.loans.upsert(loan.clone())?;
        self.storage.loans.save()?;
        self.storage.log_create(&loan)?;

        Ok(loan)
    }

    /// Default expected return for a loan starting on `start_date`
    pub fn default_return(start_date: NaiveDate, loan_days: u32) -> NaiveDate {
        start_date + Duration::days(i64::from(loan_days))
    }

    pub fn get(&self, id: LoanId) -> MaterielResult<Option<Loan>> {
        self.storage.loans.get(id)
    }

    pub fn find(&self, identifier: &str) -> MaterielResult<Option<Loan>> {
        self.storage.loans.find(identifier)
    }

    /// Loans, most recent start first
    pub fn list(&self, active_only: bool) -> MaterielResult<Vec<Loan>> {
        let mut loans = self
            .storage
            .loans
            .filter(|l| !active_only || l.is_active())?;
        loans.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(loans)
    }

    /// Active loans past their expected return, oldest due date first
    pub fn overdue(&self, today: NaiveDate) -> MaterielResult<Vec<Loan>> {
        let mut loans = self.storage.loans.filter(|l| l.is_overdue(today))?;
        loans.sort_by_key(|l| l.expected_return);
        Ok(loans)
    }

    pub fn return_loan(&self, id: LoanId, date: NaiveDate) -> MaterielResult<Loan> {
        let mut loan = self.storage.loans.require(id)?;
        if !loan.is_active() {
            return Err(MaterielError::InvalidState {
                expected: "active loan",
                actual: "already returned".into(),
            });
        }
        let before = loan.clone();

        loan.mark_returned(date);
        loan.validate().map_err(MaterielError::Validation)?;

        self.storage.loans.upsert(loan.clone())?;
        self.storage.loans.save()?;
        self.storage.log_update(&before, &loan)?;

        Ok(loan)
    }

    /// Move the expected return date of an active loan
    pub fn extend(&self, id: LoanId, expected_return: NaiveDate) -> MaterielResult<Loan> {
        let mut loan = self.storage.loans.require(id)?;
        if !loan.is_active() {
            return Err(MaterielError::InvalidState {
                expected: "active loan",
                actual: "already returned".into(),
            });
        }
        let before = loan.clone();

        loan.expected_return = Some(expected_return);
        loan.updated_at = Utc::now();
        loan.validate().map_err(MaterielError::Validation)?;

        self.storage.loans.upsert(loan.clone())?;
        self.storage.loans.save()?;
        self.storage.log_update(&before, &loan)?;

        Ok(loan)
    }

    pub fn delete(&self, id: LoanId) -> MaterielResult<Loan> {
        let loan = self.storage.loans.require(id)?;

        self.storage.loans.delete(id)?;
        self.storage.loans.save()?;
        self.storage.log_delete(&loan)?;

        Ok(loan)
    }
}
