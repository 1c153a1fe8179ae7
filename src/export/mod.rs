//! Export module for Materiel
//!
//! - JSON: full snapshot of the commerce and equipment data
//! - CSV: articles, transactions and materials for spreadsheets

pub mod csv;
pub mod json;

pub use self::csv::{export_articles_csv, export_materials_csv, export_transactions_csv};
pub use json::{export_full_json, ExportMetadata, FullExport, EXPORT_SCHEMA_VERSION};
