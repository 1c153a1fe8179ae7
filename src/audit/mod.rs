//! Audit trail for Materiel
//!
//! Every create, update and delete performed by a service is appended to a
//! line-delimited JSON log (`audit.log`) together with the entity state
//! before and after the change.
//!
//! - [`AuditEntry`] is one line of the log.
//! - [`AuditLogger`] appends and reads entries.
//! - [`summarize_changes`] builds the short "field: old -> new" summary
//!   stored with updates.

mod diff;
mod entry;
mod logger;

pub use diff::summarize_changes;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
