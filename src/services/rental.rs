//! Rental service
//!
//! Paid rentals priced per day. The price goes through the same
//! calculator as commerce lines; the deposit is settled on return.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{MaterielError, MaterielResult};
use crate::models::{Discount, Money, PaymentStatus, Rental, RentalId};
use crate::pricing::{
    classify_payment, rental_days, settle_deposit, DepositSettlement, DueStatus, LinePricing,
};
use crate::storage::Storage;

use super::material::MaterialService;

/// A rental with its computed price
#[derive(Debug, Clone, Serialize)]
pub struct PricedRental {
    pub rental: Rental,
    pub days: i64,
    pub pricing: LinePricing,
}

/// Result of bringing a rental back
#[derive(Debug, Clone, Serialize)]
pub struct RentalReturn {
    pub rental: Rental,
    pub settlement: DepositSettlement,
}

pub struct RentalService<'a> {
    storage: &'a Storage,
}

impl<'a> RentalService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Price of a rental: daily rate times the inclusive number of days
    pub fn pricing(rental: &Rental) -> LinePricing {
        LinePricing::compute(
            rental.daily_rate,
            Decimal::from(rental_days(rental.start_date, rental.end_date)),
            rental.vat_rate,
            &rental.discount,
        )
    }

    pub fn priced(rental: Rental) -> PricedRental {
        PricedRental {
            days: rental_days(rental.start_date, rental.end_date),
            pricing: Self::pricing(&rental),
            rental,
        }
    }

    pub fn create(&self, mut rental: Rental) -> MaterielResult<Rental> {
        MaterialService::new(self.storage).ensure_available(rental.material_id)?;
        self.storage.persons.require(rental.person_id)?;

        rental.returned_on = None;
        rental.deposit_outcome = Default::default();
        rental.validate().map_err(MaterielError::Validation)?;

        self.storage.rentals.upsert(rental.clone())?;
        self.storage.rentals.save()?;
        self.storage.log_create(&rental)?;

        Ok(rental)
    }

    pub fn get(&self, id: RentalId) -> MaterielResult<Option<Rental>> {
        self.storage.rentals.get(id)
    }

    pub fn find(&self, identifier: &str) -> MaterielResult<Option<Rental>> {
        self.storage.rentals.find(identifier)
    }

    /// Rentals, most recent start first
    pub fn list(&self, active_only: bool) -> MaterielResult<Vec<PricedRental>> {
        let mut rentals = self
            .storage
            .rentals
            .filter(|r| !active_only || r.is_active())?;
        rentals.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rentals.into_iter().map(Self::priced).collect())
    }

    /// Active rentals still out after their last rented day
    pub fn late(&self, today: NaiveDate) -> MaterielResult<Vec<Rental>> {
        let mut rentals = self.storage.rentals.filter(|r| r.is_late(today))?;
        rentals.sort_by_key(|r| r.end_date);
        Ok(rentals)
    }

    /// Unpaid rentals with their due status, most urgent first
    pub fn unpaid(&self, today: NaiveDate) -> MaterielResult<Vec<(PricedRental, DueStatus)>> {
        let mut unpaid: Vec<(PricedRental, DueStatus)> = self
            .storage
            .rentals
            .filter(|r| !r.payment.is_paid())?
            .into_iter()
            .map(|r| {
                let status = classify_payment(&r.payment, today);
                (Self::priced(r), status)
            })
            .collect();
        unpaid.sort_by_key(|(p, status)| (*status, p.rental.payment.due_date()));
        Ok(unpaid)
    }

    /// Bring a rental back and settle its deposit
    ///
    /// `retained` is the part of the deposit kept; it must lie between zero
    /// and the deposit.
    pub fn return_rental(
        &self,
        id: RentalId,
        date: NaiveDate,
        retained: Money,
    ) -> MaterielResult<RentalReturn> {
        let mut rental = self.storage.rentals.require(id)?;
        if !rental.is_active() {
            return Err(MaterielError::InvalidState {
                expected: "active rental",
                actual: "already returned".into(),
            });
        }
        if date < rental.start_date {
            return Err(MaterielError::Validation(
                "Return date cannot be before the start date".into(),
            ));
        }

        let settlement = settle_deposit(rental.deposit, retained)?;
        let before = rental.clone();

        rental.returned_on = Some(date);
        rental.deposit_outcome = settlement.outcome;
        rental.updated_at = Utc::now();

        self.storage.rentals.upsert(rental.clone())?;
        self.storage.rentals.save()?;
        self.storage.log_update(&before, &rental)?;

        if date > rental.end_date {
            tracing::info!(rental = %rental.id, end = %rental.end_date, returned = %date, "rental returned late");
        }

        Ok(RentalReturn { rental, settlement })
    }

    pub fn mark_paid(&self, id: RentalId, date: NaiveDate) -> MaterielResult<Rental> {
        let mut rental = self.storage.rentals.require(id)?;
        if rental.payment.is_paid() {
            return Err(MaterielError::InvalidState {
                expected: "unpaid rental",
                actual: "already paid".into(),
            });
        }
        let before = rental.clone();

        rental.payment = PaymentStatus::paid_on(date);
        rental.updated_at = Utc::now();

        self.storage.rentals.upsert(rental.clone())?;
        self.storage.rentals.save()?;
        self.storage.log_update(&before, &rental)?;

        Ok(rental)
    }

    pub fn set_discount(&self, id: RentalId, discount: Discount) -> MaterielResult<Rental> {
        let mut rental = self.storage.rentals.require(id)?;
        let before = rental.clone();

        rental.discount = discount;
        rental.updated_at = Utc::now();
        rental.validate().map_err(MaterielError::Validation)?;

        self.storage.rentals.upsert(rental.clone())?;
        self.storage.rentals.save()?;
        self.storage.log_update(&before, &rental)?;

        Ok(rental)
    }

    pub fn delete(&self, id: RentalId) -> MaterielResult<Rental> {
        let rental = self.storage.rentals.require(id)?;

        self.storage.rentals.delete(id)?;
        self.storage.rentals.save()?;
        self.storage.log_delete(&rental)?;

        Ok(rental)
    }

    /// Tax-included revenue of rentals starting in the period
    pub fn revenue(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> MaterielResult<Money> {
        Ok(self
            .storage
            .rentals
            .filter(|r| {
                from.map_or(true, |f| r.start_date >= f) && to.map_or(true, |t| r.start_date <= t)
            })?
            .iter()
            .map(|r| Self::pricing(r).net_incl_tax)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::MaterielPaths;
    use crate::models::{DepositOutcome, Material, MaterialStatus, Person, VatRate};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = MaterielPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn new_rental(storage: &Storage) -> Rental {
        let material = MaterialService::new(storage)
            .create(Material::new("Bétonnière"))
            .unwrap();
        let person = Person::new("Marc");
        storage.persons.upsert(person.clone()).unwrap();

        let mut rental = Rental::new(
            material.id,
            person.id,
            date(1),
            date(3),
            Money::from_cents(1000),
            VatRate::Standard,
        );
        rental.deposit = Money::from_cents(20000);
        rental
    }

    #[test]
    fn test_pricing_matches_calculator() {
        let (_temp_dir, storage) = create_test_storage();
        let mut rental = new_rental(&storage);
        rental.discount = Discount::Percentage(Decimal::from(10));

        let pricing = RentalService::pricing(&rental);
        assert_eq!(pricing.gross_excl_tax.cents(), 3000);
        assert_eq!(pricing.tax.cents(), 600);
        assert_eq!(pricing.gross_incl_tax.cents(), 3600);
        assert_eq!(pricing.discount.cents(), 360);
        assert_eq!(pricing.net_incl_tax.cents(), 3240);
        assert_eq!(pricing.net_excl_tax.cents(), 2700);
        assert_eq!(pricing.net_tax.cents(), 540);
    }

    #[test]
    fn test_return_settles_deposit() {
        let (_temp_dir, storage) = create_test_storage();
        let service = RentalService::new(&storage);
        let rental = service.create(new_rental(&storage)).unwrap();
        assert_eq!(
            MaterialService::new(&storage).status(rental.material_id).unwrap(),
            MaterialStatus::Rented
        );

        let back = service
            .return_rental(rental.id, date(3), Money::from_cents(5000))
            .unwrap();
        assert_eq!(back.settlement.returned.cents(), 15000);
        assert_eq!(
            back.rental.deposit_outcome,
            DepositOutcome::PartiallyRetained(Money::from_cents(5000))
        );
        assert_eq!(
            MaterialService::new(&storage).status(rental.material_id).unwrap(),
            MaterialStatus::Available
        );
    }

    #[test]
    fn test_excessive_retention_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = RentalService::new(&storage);
        let rental = service.create(new_rental(&storage)).unwrap();

        let err = service
            .return_rental(rental.id, date(3), Money::from_cents(25000))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(service.get(rental.id).unwrap().unwrap().is_active());
    }

    #[test]
    fn test_late_and_unpaid() {
        let (_temp_dir, storage) = create_test_storage();
        let service = RentalService::new(&storage);
        let mut rental = new_rental(&storage);
        rental.payment = PaymentStatus::unpaid(Some(date(5)));
        let rental = service.create(rental).unwrap();

        assert!(service.late(date(3)).unwrap().is_empty());
        assert_eq!(service.late(date(4)).unwrap().len(), 1);

        let unpaid = service.unpaid(date(6)).unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].1, DueStatus::Overdue);

        service.mark_paid(rental.id, date(6)).unwrap();
        assert!(service.unpaid(date(6)).unwrap().is_empty());
        assert!(service.mark_paid(rental.id, date(7)).is_err());
    }

    #[test]
    fn test_revenue() {
        let (_temp_dir, storage) = create_test_storage();
        let service = RentalService::new(&storage);
        service.create(new_rental(&storage)).unwrap();

        assert_eq!(service.revenue(None, None).unwrap().cents(), 3600);
        assert!(service.revenue(Some(date(2)), None).unwrap().is_zero());
    }
}
