//! Materiel - inventory, equipment lending and document safe for small
//! workshops
//!
//! The library covers three areas:
//!
//! - commerce: articles sold by unit or by weight, purchases and sales with
//!   French VAT rates, discounts, payment tracking and margins
//! - equipment: materials that are lent, rented out with a deposit, or sent
//!   for repair
//! - vault: a password-protected safe for invoices and photos proving
//!   ownership, with a recovery question and a full reset path
//!
//! # Architecture
//!
//! - `config`: path resolution and user settings
//! - `error`: the crate error type
//! - `models`: domain types (money, VAT, articles, materials, ...)
//! - `pricing`: pure pricing and accounting rules
//! - `storage`: JSON file storage with atomic writes
//! - `services`: business operations on top of storage
//! - `audit`: append-only log of every change
//! - `crypto`, `vault`: password hashing, encryption and the vault session
//! - `export`: JSON and CSV export
//! - `display`, `cli`: terminal output and command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use materiel::config::{paths::MaterielPaths, settings::Settings};
//! use materiel::storage::Storage;
//!
//! let paths = MaterielPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod pricing;
pub mod services;
pub mod storage;
pub mod vault;

pub use error::MaterielError;
