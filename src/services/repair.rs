//! Repair service

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::error::{MaterielError, MaterielResult};
use crate::models::{Discount, Money, PaymentStatus, Repair, RepairId, RepairStatus};
use crate::pricing::LinePricing;
use crate::storage::Storage;

use super::material::MaterialService;

pub struct RepairService<'a> {
    storage: &'a Storage,
}

impl<'a> RepairService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Cost breakdown of a repair (single unit, no discount)
    pub fn pricing(repair: &Repair) -> LinePricing {
        LinePricing::compute(
            repair.cost,
            Decimal::ONE,
            repair.vat_rate,
            &Discount::None,
        )
    }

    /// Send an available material to repair
    pub fn create(&self, mut repair: Repair) -> MaterielResult<Repair> {
        MaterialService::new(self.storage).ensure_available(repair.material_id)?;
        if let Some(person_id) = repair.repairer_id {
            self.storage.persons.require(person_id)?;
        }

        repair.description = repair.description.trim().to_string();
        repair.validate().map_err(MaterielError::Validation)?;

        self.storage.repairs.upsert(repair.clone())?;
        self.storage.repairs.save()?;
        self.storage.log_create(&repair)?;

        Ok(repair)
    }

    pub fn get(&self, id: RepairId) -> MaterielResult<Option<Repair>> {
        self.storage.repairs.get(id)
    }

    pub fn find(&self, identifier: &str) -> MaterielResult<Option<Repair>> {
        self.storage.repairs.find(identifier)
    }

    /// Repairs, most recent start first
    pub fn list(&self, active_only: bool) -> MaterielResult<Vec<Repair>> {
        let mut repairs = self
            .storage
            .repairs
            .filter(|r| !active_only || r.is_active())?;
        repairs.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(repairs)
    }

    /// Move a repair between pending and in progress
    ///
    /// Completion goes through [`RepairService::complete`], which records the
    /// end date and final cost.
    pub fn set_status(&self, id: RepairId, status: RepairStatus) -> MaterielResult<Repair> {
        let mut repair = self.storage.repairs.require(id)?;
        if !repair.is_active() {
            return Err(MaterielError::InvalidState {
                expected: "repair in progress",
                actual: repair.status.to_string(),
            });
        }
        if status == RepairStatus::Completed {
            return Err(MaterielError::Validation(
                "Use complete to close a repair".into(),
            ));
        }
        let before = repair.clone();

        repair.status = status;
        repair.updated_at = Utc::now();

        self.storage.repairs.upsert(repair.clone())?;
        self.storage.repairs.save()?;
        self.storage.log_update(&before, &repair)?;

        Ok(repair)
    }

    /// Close a repair, optionally with its final cost before tax
    pub fn complete(
        &self,
        id: RepairId,
        date: NaiveDate,
        cost: Option<Money>,
    ) -> MaterielResult<Repair> {
        let mut repair = self.storage.repairs.require(id)?;
        if !repair.is_active() {
            return Err(MaterielError::InvalidState {
                expected: "repair in progress",
                actual: repair.status.to_string(),
            });
        }
        let before = repair.clone();

        repair.complete(date);
        if let Some(cost) = cost {
            repair.cost = cost;
            // A cost known only at completion has not been settled yet
            if !cost.is_zero() && repair.payment == PaymentStatus::default() {
                repair.payment = PaymentStatus::unpaid(None);
            }
        }
        repair.validate().map_err(MaterielError::Validation)?;

        self.storage.repairs.upsert(repair.clone())?;
        self.storage.repairs.save()?;
        self.storage.log_update(&before, &repair)?;

        Ok(repair)
    }

    pub fn mark_paid(&self, id: RepairId, date: NaiveDate) -> MaterielResult<Repair> {
        let mut repair = self.storage.repairs.require(id)?;
        if repair.payment.is_paid() {
            return Err(MaterielError::InvalidState {
                expected: "unpaid repair",
                actual: "already paid".into(),
            });
        }
        let before = repair.clone();

        repair.payment = PaymentStatus::paid_on(date);
        repair.updated_at = Utc::now();

        self.storage.repairs.upsert(repair.clone())?;
        self.storage.repairs.save()?;
        self.storage.log_update(&before, &repair)?;

        Ok(repair)
    }

    pub fn delete(&self, id: RepairId) -> MaterielResult<Repair> {
        let repair = self.storage.repairs.require(id)?;

        self.storage.repairs.delete(id)?;
        self.storage.repairs.save()?;
        self.storage.log_delete(&repair)?;

        Ok(repair)
    }

    /// Tax-included cost of repairs completed in the period
    pub fn total_cost(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> MaterielResult<Money> {
        Ok(self
            .storage
            .repairs
            .filter(|r| match r.end_date {
                Some(end) => from.map_or(true, |f| end >= f) && to.map_or(true, |t| end <= t),
                None => false,
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
    use crate::models::{Material, MaterialId, MaterialStatus, VatRate};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = MaterielPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn material(storage: &Storage) -> MaterialId {
        MaterialService::new(storage)
            .create(Material::new("Tronçonneuse"))
            .unwrap()
            .id
    }

    #[test]
    fn test_repair_lifecycle() {
        let (_temp_dir, storage) = create_test_storage();
        let material_id = material(&storage);
        let service = RepairService::new(&storage);

        let repair = service
            .create(Repair::new(material_id, "  Chaîne cassée ", date(1)))
            .unwrap();
        assert_eq!(repair.description, "Chaîne cassée");
        assert_eq!(
            MaterialService::new(&storage).status(material_id).unwrap(),
            MaterialStatus::InRepair
        );

        service.set_status(repair.id, RepairStatus::InProgress).unwrap();
        let done = service
            .complete(repair.id, date(8), Some(Money::from_cents(4550)))
            .unwrap();
        assert_eq!(done.status, RepairStatus::Completed);
        assert_eq!(done.end_date, Some(date(8)));
        assert_eq!(
            MaterialService::new(&storage).status(material_id).unwrap(),
            MaterialStatus::Available
        );

        assert!(service.complete(repair.id, date(9), None).is_err());
        assert!(service.set_status(repair.id, RepairStatus::Pending).is_err());
    }

    #[test]
    fn test_pricing_and_total_cost() {
        let (_temp_dir, storage) = create_test_storage();
        let material_id = material(&storage);
        let service = RepairService::new(&storage);

        let mut repair = Repair::new(material_id, "Révision", date(1));
        repair.vat_rate = VatRate::Intermediate;
        let repair = service.create(repair).unwrap();
        service
            .complete(repair.id, date(3), Some(Money::from_cents(10000)))
            .unwrap();

        assert_eq!(service.total_cost(None, None).unwrap().cents(), 11000);
        assert!(service.total_cost(Some(date(4)), None).unwrap().is_zero());
    }

    #[test]
    fn test_completion_through_set_status_refused() {
        let (_temp_dir, storage) = create_test_storage();
        let material_id = material(&storage);
        let service = RepairService::new(&storage);
        let repair = service.create(Repair::new(material_id, "Lame", date(1))).unwrap();

        assert!(service
            .set_status(repair.id, RepairStatus::Completed)
            .unwrap_err()
            .is_validation());
    }
}
