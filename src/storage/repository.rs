//! Generic JSON-backed repository
//!
//! Every entity collection is held in memory behind a `RwLock` and saved as
//! a single `{"items": [...]}` document with an atomic write.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::audit::EntityType;
use crate::error::MaterielError;
use crate::models::{
    Article, ArticleId, Loan, LoanId, Material, MaterialId, Person, PersonId, Rental, RentalId,
    Repair, RepairId, Transaction, TransactionId, VaultItem, VaultItemId,
};

use super::file_io::{read_json, write_json_atomic};

/// An entity that can be stored in a [`Repository`]
pub trait Entity: Clone + Serialize + DeserializeOwned {
    type Id: Copy + Eq + Hash + std::fmt::Display + FromStr;

    const ENTITY_TYPE: EntityType;

    fn id(&self) -> Self::Id;

    /// Human-readable label, used for name lookups
    fn label(&self) -> String;

    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_entity {
    ($ty:ty, $id:ty, $kind:ident, |$e:ident| $label:expr) => {
        impl Entity for $ty {
            type Id = $id;
            const ENTITY_TYPE: EntityType = EntityType::$kind;

            fn id(&self) -> Self::Id {
                self.id
            }

            fn label(&self) -> String {
                let $e = self;
                $label
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

impl_entity!(Article, ArticleId, Article, |a| a.name.clone());
impl_entity!(Transaction, TransactionId, Transaction, |t| t.to_string());
impl_entity!(Material, MaterialId, Material, |m| m.name.clone());
impl_entity!(Person, PersonId, Person, |p| p.name.clone());
impl_entity!(Loan, LoanId, Loan, |l| l.id.to_string());
impl_entity!(Rental, RentalId, Rental, |r| r.id.to_string());
impl_entity!(Repair, RepairId, Repair, |r| r.description.clone());
impl_entity!(VaultItem, VaultItemId, VaultItem, |d| d.title.clone());

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct FileData<T> {
    items: Vec<T>,
}

impl<T> Default for FileData<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

/// Repository for one entity collection
pub struct Repository<T: Entity> {
    path: PathBuf,
    data: RwLock<HashMap<T::Id, T>>,
}

impl<T: Entity> Repository<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<T::Id, T>>, MaterielError> {
        self.data
            .read()
            .map_err(|e| MaterielError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<T::Id, T>>, MaterielError> {
        self.data
            .write()
            .map_err(|e| MaterielError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Load the collection from disk, replacing what is in memory
    pub fn load(&self) -> Result<(), MaterielError> {
        let file_data: FileData<T> = read_json(&self.path)?;

        let mut data = self.write()?;
        data.clear();
        for item in file_data.items {
            data.insert(item.id(), item);
        }

        Ok(())
    }

    /// Save the collection to disk, oldest first
    pub fn save(&self) -> Result<(), MaterielError> {
        let items = self.get_all()?;
        write_json_atomic(&self.path, &FileData { items })
    }

    pub fn get(&self, id: T::Id) -> Result<Option<T>, MaterielError> {
        Ok(self.read()?.get(&id).cloned())
    }

    /// Get an entity or a "not found" error
    pub fn require(&self, id: T::Id) -> Result<T, MaterielError> {
        self.get(id)?
            .ok_or_else(|| MaterielError::not_found(T::ENTITY_TYPE.as_str(), id.to_string()))
    }

    /// All entities, oldest first
    pub fn get_all(&self) -> Result<Vec<T>, MaterielError> {
        let mut items: Vec<T> = self.read()?.values().cloned().collect();
        items.sort_by_key(|item| item.created_at());
        Ok(items)
    }

    /// All entities matching a predicate, oldest first
    pub fn filter<F>(&self, predicate: F) -> Result<Vec<T>, MaterielError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|item| predicate(item))
            .collect())
    }

    /// Find an entity by label (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Result<Option<T>, MaterielError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .read()?
            .values()
            .find(|item| item.label().to_lowercase() == name_lower)
            .cloned())
    }

    /// Check if a label is already taken by another entity
    pub fn name_exists(&self, name: &str, exclude_id: Option<T::Id>) -> Result<bool, MaterielError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self.read()?.values().any(|item| {
            item.label().to_lowercase() == name_lower && Some(item.id()) != exclude_id
        }))
    }

    /// Find an entity by label, full UUID or short id ("mat-1a2b3c4d")
    pub fn find(&self, identifier: &str) -> Result<Option<T>, MaterielError> {
        let identifier = identifier.trim();
        if let Some(item) = self.find_by_name(identifier)? {
            return Ok(Some(item));
        }

        if let Ok(id) = identifier.parse::<T::Id>() {
            if let Some(item) = self.get(id)? {
                return Ok(Some(item));
            }
        }

        let short = identifier.to_lowercase();
        if short.len() < 4 {
            return Ok(None);
        }
        let data = self.read()?;
        let mut matches = data.values().filter(|item| {
            let display = item.id().to_string();
            display == short || display.split_once('-').is_some_and(|(_, hex)| hex == short)
        });
        let found = match (matches.next(), matches.next()) {
            (Some(item), None) => Some(item.clone()),
            _ => None,
        };
        Ok(found)
    }

    /// Like [`Repository::find`], with a "not found" error
    pub fn resolve(&self, identifier: &str) -> Result<T, MaterielError> {
        self.find(identifier)?
            .ok_or_else(|| MaterielError::not_found(T::ENTITY_TYPE.as_str(), identifier.trim()))
    }

    pub fn upsert(&self, item: T) -> Result<(), MaterielError> {
        self.write()?.insert(item.id(), item);
        Ok(())
    }

    pub fn delete(&self, id: T::Id) -> Result<bool, MaterielError> {
        Ok(self.write()?.remove(&id).is_some())
    }

    /// Remove every entity (memory only until `save`)
    pub fn clear(&self) -> Result<(), MaterielError> {
        self.write()?.clear();
        Ok(())
    }

    pub fn exists(&self, id: T::Id) -> Result<bool, MaterielError> {
        Ok(self.read()?.contains_key(&id))
    }

    pub fn count(&self) -> Result<usize, MaterielError> {
        Ok(self.read()?.len())
    }
}
