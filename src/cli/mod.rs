//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod article;
pub mod dashboard;
pub mod export;
pub mod input;
pub mod loan;
pub mod material;
pub mod person;
pub mod rental;
pub mod repair;
pub mod transaction;
pub mod vault;

pub use article::{handle_article_command, ArticleCommands};
pub use dashboard::{handle_dashboard_command, handle_history_command};
pub use export::{handle_export_command, ExportCommands};
pub use loan::{handle_loan_command, LoanCommands};
pub use material::{handle_material_command, MaterialCommands};
pub use person::{handle_person_command, PersonCommands};
pub use rental::{handle_rental_command, RentalCommands};
pub use repair::{handle_repair_command, RepairCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use vault::{handle_vault_command, VaultCommands};
