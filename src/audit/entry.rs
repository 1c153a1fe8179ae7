//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// Kinds of records tracked by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Article,
    Transaction,
    Material,
    Person,
    Loan,
    Rental,
    Repair,
    VaultItem,
}

impl EntityType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "article" | "articles" => Some(Self::Article),
            "transaction" | "transactions" | "txn" => Some(Self::Transaction),
            "material" | "materials" => Some(Self::Material),
            "person" | "persons" => Some(Self::Person),
            "loan" | "loans" => Some(Self::Loan),
            "rental" | "rentals" => Some(Self::Rental),
            "repair" | "repairs" => Some(Self::Repair),
            "document" | "documents" | "vault" => Some(Self::VaultItem),
            _ => None,
        }
    }

    /// Name used in messages ("Article", "Document", ...)
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityType::Article => "Article",
            EntityType::Transaction => "Transaction",
            EntityType::Material => "Material",
            EntityType::Person => "Person",
            EntityType::Loan => "Loan",
            EntityType::Rental => "Rental",
            EntityType::Repair => "Repair",
            EntityType::VaultItem => "Document",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    pub entity_id: String,

    /// Human-readable label of the entity (article name, loan id, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// Entity state before the operation (updates and deletes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    /// Entity state after the operation (creates and updates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    fn new(
        operation: Operation,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id,
            entity_name,
            before: None,
            after: None,
            diff_summary: None,
        }
    }

    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            after: serde_json::to_value(entity).ok(),
            ..Self::new(Operation::Create, entity_type, entity_id.into(), entity_name)
        }
    }

    /// Build an update entry; the change summary is computed from both states
    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Self {
        let before = serde_json::to_value(before).ok();
        let after = serde_json::to_value(after).ok();
        let diff_summary = match (&before, &after) {
            (Some(b), Some(a)) => super::summarize_changes(b, a),
            _ => None,
        };

        Self {
            before,
            after,
            diff_summary,
            ..Self::new(Operation::Update, entity_type, entity_id.into(), entity_name)
        }
    }

    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            before: serde_json::to_value(entity).ok(),
            ..Self::new(Operation::Delete, entity_type, entity_id.into(), entity_name)
        }
    }

    /// One-line rendering used by `materiel history`
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  {}", diff));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_entry_has_only_after() {
        let entry = AuditEntry::create(
            EntityType::Article,
            "art-12345678",
            Some("Vis 4x40".to_string()),
            &json!({"name": "Vis 4x40", "stock": "120"}),
        );

        assert_eq!(entry.operation, Operation::Create);
        assert!(entry.before.is_none());
        assert!(entry.after.is_some());
        assert!(entry.diff_summary.is_none());
    }

    #[test]
    fn test_update_entry_computes_summary() {
        let entry = AuditEntry::update(
            EntityType::Loan,
            "loan-1",
            None,
            &json!({"returned_on": null}),
            &json!({"returned_on": "2024-03-01"}),
        );

        assert_eq!(entry.operation, Operation::Update);
        assert_eq!(
            entry.diff_summary.as_deref(),
            Some("returned_on: null -> \"2024-03-01\"")
        );
    }

    #[test]
    fn test_delete_entry_has_only_before() {
        let entry = AuditEntry::delete(EntityType::Person, "per-1", None, &json!({"name": "Lea"}));
        assert!(entry.before.is_some());
        assert!(entry.after.is_none());
    }

    #[test]
    fn test_entity_type_names() {
        assert_eq!(EntityType::VaultItem.to_string(), "Document");
        assert_eq!(
            serde_json::to_string(&EntityType::VaultItem).unwrap(),
            "\"vault_item\""
        );
        assert_eq!(EntityType::parse("Materials"), Some(EntityType::Material));
        assert_eq!(EntityType::parse("vault"), Some(EntityType::VaultItem));
        assert_eq!(EntityType::parse("budget"), None);
    }

    #[test]
    fn test_human_readable_format() {
        let entry = AuditEntry::create(
            EntityType::Material,
            "mat-12345678",
            Some("Perceuse".to_string()),
            &json!({}),
        );

        let formatted = entry.format_human_readable();
        assert!(formatted.contains("CREATE Material mat-12345678 (Perceuse)"));
    }
}
