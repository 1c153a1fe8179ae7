//! Storage layer for Materiel
//!
//! One JSON file per entity collection, written atomically. [`Storage`]
//! owns every repository plus the audit logger and is passed explicitly to
//! the services.

pub mod file_io;
pub mod init;
pub mod repository;

pub use file_io::{read_json, read_json_required, write_json_atomic, write_json_private};
pub use init::initialize_storage;
pub use repository::{Entity, Repository};

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::MaterielPaths;
use crate::error::MaterielError;
use crate::models::{Article, Loan, Material, Person, Rental, Repair, Transaction, VaultItem};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: MaterielPaths,
    audit: AuditLogger,
    pub articles: Repository<Article>,
    pub transactions: Repository<Transaction>,
    pub materials: Repository<Material>,
    pub persons: Repository<Person>,
    pub loans: Repository<Loan>,
    pub rentals: Repository<Rental>,
    pub repairs: Repository<Repair>,
    pub vault_items: Repository<VaultItem>,
}

impl Storage {
    pub fn new(paths: MaterielPaths) -> Result<Self, MaterielError> {
        paths.ensure_directories()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            articles: Repository::new(paths.articles_file()),
            transactions: Repository::new(paths.transactions_file()),
            materials: Repository::new(paths.materials_file()),
            persons: Repository::new(paths.persons_file()),
            loans: Repository::new(paths.loans_file()),
            rentals: Repository::new(paths.rentals_file()),
            repairs: Repository::new(paths.repairs_file()),
            vault_items: Repository::new(paths.vault_items_file()),
            paths,
        })
    }

    pub fn paths(&self) -> &MaterielPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load every collection from disk
    pub fn load_all(&self) -> Result<(), MaterielError> {
        self.articles.load()?;
        self.transactions.load()?;
        self.materials.load()?;
        self.persons.load()?;
        self.loans.load()?;
        self.rentals.load()?;
        self.repairs.load()?;
        self.vault_items.load()?;
        Ok(())
    }

    /// Save every collection to disk
    pub fn save_all(&self) -> Result<(), MaterielError> {
        self.articles.save()?;
        self.transactions.save()?;
        self.materials.save()?;
        self.persons.save()?;
        self.loans.save()?;
        self.rentals.save()?;
        self.repairs.save()?;
        self.vault_items.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn log_create<T: Entity>(&self, entity: &T) -> Result<(), MaterielError> {
        self.audit.log(&AuditEntry::create(
            T::ENTITY_TYPE,
            entity.id().to_string(),
            Some(entity.label()),
            entity,
        ))
    }

    pub fn log_update<T: Entity>(&self, before: &T, after: &T) -> Result<(), MaterielError> {
        self.audit.log(&AuditEntry::update(
            T::ENTITY_TYPE,
            after.id().to_string(),
            Some(after.label()),
            before,
            after,
        ))
    }

    pub fn log_delete<T: Entity>(&self, entity: &T) -> Result<(), MaterielError> {
        self.audit.log(&AuditEntry::delete(
            T::ENTITY_TYPE,
            entity.id().to_string(),
            Some(entity.label()),
            entity,
        ))
    }
}
