//! Person service

use chrono::Utc;

use crate::error::{MaterielError, MaterielResult};
use crate::models::{Person, PersonId};
use crate::storage::Storage;

/// Fields to change on a person; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct PersonUpdate {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub notes: Option<String>,
}

pub struct PersonService<'a> {
    storage: &'a Storage,
}

impl<'a> PersonService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, mut person: Person) -> MaterielResult<Person> {
        person.name = person.name.trim().to_string();

        if self.storage.persons.name_exists(&person.name, None)? {
            return Err(MaterielError::Duplicate {
                entity_type: "Person",
                identifier: person.name,
            });
        }

        person
            .validate()
            .map_err(|e| MaterielError::Validation(e.to_string()))?;

        self.storage.persons.upsert(person.clone())?;
        self.storage.persons.save()?;
        self.storage.log_create(&person)?;

        Ok(person)
    }

    pub fn get(&self, id: PersonId) -> MaterielResult<Option<Person>> {
        self.storage.persons.get(id)
    }

    pub fn find(&self, identifier: &str) -> MaterielResult<Option<Person>> {
        self.storage.persons.find(identifier)
    }

    /// Persons sorted by name
    pub fn list(&self) -> MaterielResult<Vec<Person>> {
        let mut persons = self.storage.persons.get_all()?;
        persons.sort_by_key(|p| p.name.to_lowercase());
        Ok(persons)
    }

    pub fn update(&self, id: PersonId, changes: PersonUpdate) -> MaterielResult<Person> {
        let mut person = self.storage.persons.require(id)?;
        let before = person.clone();

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if self.storage.persons.name_exists(&name, Some(id))? {
                return Err(MaterielError::Duplicate {
                    entity_type: "Person",
                    identifier: name,
                });
            }
            person.name = name;
        }
        if let Some(phone) = changes.phone {
            person.phone = phone;
        }
        if let Some(email) = changes.email {
            person.email = email;
        }
        if let Some(notes) = changes.notes {
            person.notes = notes;
        }

        person.updated_at = Utc::now();
        person
            .validate()
            .map_err(|e| MaterielError::Validation(e.to_string()))?;

        self.storage.persons.upsert(person.clone())?;
        self.storage.persons.save()?;
        self.storage.log_update(&before, &person)?;

        Ok(person)
    }

    /// Delete a person with no active loan or rental
    pub fn delete(&self, id: PersonId) -> MaterielResult<Person> {
        let person = self.storage.persons.require(id)?;

        let loans = self
            .storage
            .loans
            .filter(|l| l.person_id == id && l.is_active())?
            .len();
        let rentals = self
            .storage
            .rentals
            .filter(|r| r.person_id == id && r.is_active())?
            .len();

        if loans + rentals > 0 {
            return Err(MaterielError::InUse {
                entity_type: "Person",
                reason: format!(
                    "'{}' still has {} active loan(s) and {} active rental(s)",
                    person.name, loans, rentals
                ),
            });
        }

        self.storage.persons.delete(id)?;
        self.storage.persons.save()?;
        self.storage.log_delete(&person)?;

        Ok(person)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::MaterielPaths;
    use crate::models::{Loan, MaterialId};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = MaterielPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_validates_email() {
        let (_temp_dir, storage) = create_test_storage();
        let service = PersonService::new(&storage);

        let mut person = Person::new("Lea");
        person.email = Some("lea-at-example".into());
        assert!(service.create(person).unwrap_err().is_validation());

        let mut person = Person::new("Lea");
        person.email = Some("lea@example.fr".into());
        assert!(service.create(person).is_ok());
    }

    #[test]
    fn test_update_clears_phone() {
        let (_temp_dir, storage) = create_test_storage();
        let service = PersonService::new(&storage);
        let mut person = Person::new("Hugo");
        person.phone = Some("06 12 34 56 78".into());
        let person = service.create(person).unwrap();

        let updated = service
            .update(
                person.id,
                PersonUpdate {
                    phone: Some(None),
                    notes: Some("voisin".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.phone.is_none());
        assert_eq!(updated.notes, "voisin");
    }

    #[test]
    fn test_delete_refused_with_active_loan() {
        let (_temp_dir, storage) = create_test_storage();
        let service = PersonService::new(&storage);
        let person = service.create(Person::new("Nina")).unwrap();

        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let mut loan = Loan::new(MaterialId::new(), person.id, start);
        storage.loans.upsert(loan.clone()).unwrap();

        let err = service.delete(person.id).unwrap_err();
        assert!(matches!(err, MaterielError::InUse { .. }));

        loan.mark_returned(start);
        storage.loans.upsert(loan).unwrap();
        service.delete(person.id).unwrap();
        assert!(service.get(person.id).unwrap().is_none());
    }
}
