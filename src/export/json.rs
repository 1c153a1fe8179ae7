//! JSON export
//!
//! A full snapshot of the commerce and equipment data with schema
//! versioning. Keys are written in sorted order and dates in ISO-8601.
//! Vault documents stay in the safe and are not exported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;

use crate::error::{MaterielError, MaterielResult};
use crate::models::{Article, Loan, Material, Person, Rental, Repair, Transaction};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub articles: Vec<Article>,
    pub transactions: Vec<Transaction>,
    pub persons: Vec<Person>,
    pub materials: Vec<Material>,
    pub loans: Vec<Loan>,
    pub rentals: Vec<Rental>,
    pub repairs: Vec<Repair>,

    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub article_count: usize,
    pub transaction_count: usize,
    pub material_count: usize,
    pub person_count: usize,

    /// Date of the first transaction (ISO-8601)
    pub earliest_transaction: Option<String>,

    /// Date of the last transaction (ISO-8601)
    pub latest_transaction: Option<String>,
}

impl FullExport {
    pub fn from_storage(storage: &Storage) -> MaterielResult<Self> {
        let articles = storage.articles.get_all()?;
        let transactions = storage.transactions.get_all()?;
        let persons = storage.persons.get_all()?;
        let materials = storage.materials.get_all()?;

        let metadata = ExportMetadata {
            article_count: articles.len(),
            transaction_count: transactions.len(),
            material_count: materials.len(),
            person_count: persons.len(),
            earliest_transaction: transactions.iter().map(|t| t.date).min().map(|d| d.to_string()),
            latest_transaction: transactions.iter().map(|t| t.date).max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            articles,
            transactions,
            persons,
            materials,
            loans: storage.loans.get_all()?,
            rentals: storage.rentals.get_all()?,
            repairs: storage.repairs.get_all()?,
            metadata,
        })
    }

    /// Check that every reference points at an exported entity
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let article_ids: HashSet<_> = self.articles.iter().map(|a| a.id).collect();
        let person_ids: HashSet<_> = self.persons.iter().map(|p| p.id).collect();
        let material_ids: HashSet<_> = self.materials.iter().map(|m| m.id).collect();

        for txn in &self.transactions {
            if let Some(person_id) = txn.person_id {
                if !person_ids.contains(&person_id) {
                    return Err(format!(
                        "Transaction {} references unknown person {}",
                        txn.id, person_id
                    ));
                }
            }
            for line in &txn.lines {
                if let Some(article_id) = line.article_id {
                    if !article_ids.contains(&article_id) {
                        return Err(format!(
                            "Transaction {} references unknown article {}",
                            txn.id, article_id
                        ));
                    }
                }
            }
        }

        let equipment = self
            .loans
            .iter()
            .map(|l| (l.id.to_string(), l.material_id, Some(l.person_id)))
            .chain(
                self.rentals
                    .iter()
                    .map(|r| (r.id.to_string(), r.material_id, Some(r.person_id))),
            )
            .chain(
                self.repairs
                    .iter()
                    .map(|r| (r.id.to_string(), r.material_id, r.repairer_id)),
            );
        for (id, material_id, person_id) in equipment {
            if !material_ids.contains(&material_id) {
                return Err(format!("{} references unknown material {}", id, material_id));
            }
            if let Some(person_id) = person_id {
                if !person_ids.contains(&person_id) {
                    return Err(format!("{} references unknown person {}", id, person_id));
                }
            }
        }

        Ok(())
    }
}

/// Write the full snapshot as JSON
///
/// The snapshot goes through `serde_json::Value`, whose maps keep their
/// keys sorted.
pub fn export_full_json<W: Write>(
    storage: &Storage,
    writer: &mut W,
    pretty: bool,
) -> MaterielResult<()> {
    let export = FullExport::from_storage(storage)?;
    let value = serde_json::to_value(&export)
        .map_err(|e| MaterielError::Export(e.to_string()))?;

    if pretty {
        serde_json::to_writer_pretty(&mut *writer, &value)
    } else {
        serde_json::to_writer(&mut *writer, &value)
    }
    .map_err(|e| MaterielError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| MaterielError::Export(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::MaterielPaths;
    use crate::models::{
        Money, PersonId, Quantity, SoldBy, TransactionKind, TransactionLine, VatRate,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = MaterielPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn seed(storage: &Storage) {
        let article = Article::new(
            "Gravier",
            Money::from_cents(40),
            Money::from_cents(90),
            VatRate::Standard,
            SoldBy::Weight,
        );
        storage.articles.upsert(article.clone()).unwrap();

        let mut line = TransactionLine::new(
            "Gravier",
            Money::from_cents(90),
            Quantity::Weight(Decimal::new(125, 1)),
            VatRate::Standard,
        );
        line.article_id = Some(article.id);
        let txn = Transaction::new(
            TransactionKind::Sale,
            NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            vec![line],
        );
        storage.transactions.upsert(txn).unwrap();
        storage.materials.upsert(Material::new("Brouette")).unwrap();
    }

    #[test]
    fn test_full_export() {
        let (_temp_dir, storage) = create_test_storage();
        seed(&storage);

        let export = FullExport::from_storage(&storage).unwrap();
        assert_eq!(export.metadata.article_count, 1);
        assert_eq!(export.metadata.transaction_count, 1);
        assert_eq!(export.metadata.earliest_transaction.as_deref(), Some("2025-02-03"));
        assert!(export.validate().is_ok());
    }

    #[test]
    fn test_dangling_reference_detected() {
        let (_temp_dir, storage) = create_test_storage();
        seed(&storage);
        let material = storage.materials.get_all().unwrap().remove(0);
        storage
            .loans
            .upsert(Loan::new(
                material.id,
                PersonId::new(),
                NaiveDate::from_ymd_opt(2025, 2, 4).unwrap(),
            ))
            .unwrap();

        let export = FullExport::from_storage(&storage).unwrap();
        assert!(export.validate().unwrap_err().contains("unknown person"));
    }

    #[test]
    fn test_json_output_sorted_and_iso() {
        let (_temp_dir, storage) = create_test_storage();
        seed(&storage);

        let mut output = Vec::new();
        export_full_json(&storage, &mut output, true).unwrap();
        let json = String::from_utf8(output).unwrap();

        assert!(json.contains("\"date\": \"2025-02-03\""));
        let app = json.find("\"app_version\"").unwrap();
        let articles = json.find("\"articles\"").unwrap();
        let schema = json.find("\"schema_version\"").unwrap();
        assert!(app < articles && articles < schema);

        let parsed: FullExport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.articles[0].name, "Gravier");
    }
}
