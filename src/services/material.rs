//! Material service
//!
//! Equipment inventory. A material's status is never stored: it is derived
//! from the active loan, rental or repair that references it.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::{MaterielError, MaterielResult};
use crate::models::{Loan, Material, MaterialId, MaterialStatus, Money, Rental, Repair};
use crate::storage::Storage;

/// Fields to change on a material; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct MaterialUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<Option<String>>,
    pub serial_number: Option<Option<String>>,
    pub purchase_date: Option<Option<NaiveDate>>,
    pub purchase_price: Option<Option<Money>>,
    pub notes: Option<String>,
}

/// A material with its derived status
#[derive(Debug, Clone, Serialize)]
pub struct MaterialWithStatus {
    pub material: Material,
    pub status: MaterialStatus,
}

/// Everything that happened to a material, oldest first
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterialHistory {
    pub loans: Vec<Loan>,
    pub rentals: Vec<Rental>,
    pub repairs: Vec<Repair>,
}

pub struct MaterialService<'a> {
    storage: &'a Storage,
}

impl<'a> MaterialService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, mut material: Material) -> MaterielResult<Material> {
        material.name = material.name.trim().to_string();
        material
            .validate()
            .map_err(|e| MaterielError::Validation(e.to_string()))?;

        self.storage.materials.upsert(material.clone())?;
        self.storage.materials.save()?;
        self.storage.log_create(&material)?;

        Ok(material)
    }

    pub fn get(&self, id: MaterialId) -> MaterielResult<Option<Material>> {
        self.storage.materials.get(id)
    }

    pub fn find(&self, identifier: &str) -> MaterielResult<Option<Material>> {
        self.storage.materials.find(identifier)
    }

    /// Current status of a material
    pub fn status(&self, id: MaterialId) -> MaterielResult<MaterialStatus> {
        if !self
            .storage
            .loans
            .filter(|l| l.material_id == id && l.is_active())?
            .is_empty()
        {
            return Ok(MaterialStatus::Loaned);
        }
        if !self
            .storage
            .rentals
            .filter(|r| r.material_id == id && r.is_active())?
            .is_empty()
        {
            return Ok(MaterialStatus::Rented);
        }
        if !self
            .storage
            .repairs
            .filter(|r| r.material_id == id && r.is_active())?
            .is_empty()
        {
            return Ok(MaterialStatus::InRepair);
        }
        Ok(MaterialStatus::Available)
    }

    /// Fail unless the material exists and is free for a new loan, rental
    /// or repair
    pub fn ensure_available(&self, id: MaterialId) -> MaterielResult<Material> {
        let material = self.storage.materials.require(id)?;
        match self.status(id)? {
            MaterialStatus::Available => Ok(material),
            status => Err(MaterielError::InUse {
                entity_type: "Material",
                reason: format!("'{}' is currently {}", material.name, status.to_string().to_lowercase()),
            }),
        }
    }

    /// Materials sorted by name, with their status
    pub fn list(&self, status: Option<MaterialStatus>) -> MaterielResult<Vec<MaterialWithStatus>> {
        let mut materials = self.storage.materials.get_all()?;
        materials.sort_by_key(|m| m.name.to_lowercase());

        let mut listed = Vec::with_capacity(materials.len());
        for material in materials {
            let current = self.status(material.id)?;
            if status.map_or(true, |s| s == current) {
                listed.push(MaterialWithStatus {
                    material,
                    status: current,
                });
            }
        }
        Ok(listed)
    }

    pub fn history(&self, id: MaterialId) -> MaterielResult<MaterialHistory> {
        self.storage.materials.require(id)?;
        Ok(MaterialHistory {
            loans: self.storage.loans.filter(|l| l.material_id == id)?,
            rentals: self.storage.rentals.filter(|r| r.material_id == id)?,
            repairs: self.storage.repairs.filter(|r| r.material_id == id)?,
        })
    }

    pub fn update(&self, id: MaterialId, changes: MaterialUpdate) -> MaterielResult<Material> {
        let mut material = self.storage.materials.require(id)?;
        let before = material.clone();

        if let Some(name) = changes.name {
            material.name = name.trim().to_string();
        }
        if let Some(category) = changes.category {
            material.category = category.trim().to_string();
        }
        if let Some(brand) = changes.brand {
            material.brand = brand;
        }
        if let Some(serial) = changes.serial_number {
            material.serial_number = serial;
        }
        if let Some(date) = changes.purchase_date {
            material.purchase_date = date;
        }
        if let Some(price) = changes.purchase_price {
            material.purchase_price = price;
        }
        if let Some(notes) = changes.notes {
            material.notes = notes;
        }

        material.updated_at = Utc::now();
        material
            .validate()
            .map_err(|e| MaterielError::Validation(e.to_string()))?;

        self.storage.materials.upsert(material.clone())?;
        self.storage.materials.save()?;
        self.storage.log_update(&before, &material)?;

        Ok(material)
    }

    /// Delete a material that is not out on loan, rental or repair
    pub fn delete(&self, id: MaterialId) -> MaterielResult<Material> {
        let material = self.ensure_available(id)?;

        let documents = self
            .storage
            .vault_items
            .filter(|d| d.material_id == Some(id))?
            .len();
        if documents > 0 {
            tracing::info!(material = %material.name, documents, "deleting material with vault documents");
        }

        self.storage.materials.delete(id)?;
        self.storage.materials.save()?;
        self.storage.log_delete(&material)?;

        Ok(material)
    }

    /// Sum of known purchase prices before tax
    pub fn inventory_value(&self) -> MaterielResult<Money> {
        Ok(self
            .storage
            .materials
            .get_all()?
            .iter()
            .filter_map(|m| m.purchase_price)
            .sum())
    }
}
