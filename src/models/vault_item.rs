//! Vault item model
//!
//! Metadata of a proof-of-ownership document kept in the safe. The content
//! itself is an encrypted blob stored next to the metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{MaterialId, VaultItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Photo,
    Invoice,
    Pdf,
    Other,
}

impl DocumentKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "photo" | "image" => Some(Self::Photo),
            "invoice" | "facture" => Some(Self::Invoice),
            "pdf" => Some(Self::Pdf),
            "other" | "autre" => Some(Self::Other),
            _ => None,
        }
    }

    /// Guess the kind from a file extension
    pub fn from_file_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "heic" | "webp" => Self::Photo,
            "pdf" => Self::Pdf,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photo => write!(f, "Photo"),
            Self::Invoice => write!(f, "Invoice"),
            Self::Pdf => write!(f, "PDF"),
            Self::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultItem {
    pub id: VaultItemId,

    pub title: String,

    pub kind: DocumentKind,

    /// Material this document proves ownership of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<MaterialId>,

    /// Original file name, kept to restore the document
    pub file_name: String,

    /// Plaintext size in bytes
    pub size_bytes: u64,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,
}

impl VaultItem {
    pub fn new(title: impl Into<String>, kind: DocumentKind, file_name: impl Into<String>) -> Self {
        Self {
            id: VaultItemId::new(),
            title: title.into(),
            kind,
            material_id: None,
            file_name: file_name.into(),
            size_bytes: 0,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Name of the encrypted blob inside the documents directory
    pub fn blob_name(&self) -> String {
        format!("{}.enc", self.id.as_uuid())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Document title cannot be empty".into());
        }
        Ok(())
    }
}
