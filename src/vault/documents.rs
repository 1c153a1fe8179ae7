//! Encrypted vault documents
//!
//! Metadata lives in the `vault_items` collection; the file content is
//! sealed with AES-256-GCM and written to `vault/documents/<id>.enc`.

use std::fs;

use crate::crypto::{decrypt, encrypt, EncryptedData, SecretKey};
use crate::error::{MaterielError, MaterielResult};
use crate::models::{DocumentKind, MaterialId, VaultItem, VaultItemId};
use crate::storage::{read_json_required, write_json_private, Storage};

/// Input for a new vault document
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub kind: Option<DocumentKind>,
    pub file_name: String,
    pub material_id: Option<MaterialId>,
    pub notes: String,
    pub content: Vec<u8>,
}

pub struct DocumentVault<'a> {
    storage: &'a Storage,
}

impl<'a> DocumentVault<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn blob_path(&self, item: &VaultItem) -> std::path::PathBuf {
        self.storage.paths().documents_dir().join(item.blob_name())
    }

    pub fn add(&self, key: &SecretKey, doc: NewDocument) -> MaterielResult<VaultItem> {
        if let Some(material_id) = doc.material_id {
            self.storage.materials.require(material_id)?;
        }

        let kind = doc
            .kind
            .unwrap_or_else(|| DocumentKind::from_file_name(&doc.file_name));
        let mut item = VaultItem::new(doc.title.trim(), kind, doc.file_name);
        item.material_id = doc.material_id;
        item.notes = doc.notes;
        item.size_bytes = doc.content.len() as u64;

        item.validate().map_err(MaterielError::Validation)?;

        let sealed = encrypt(&doc.content, key)?;
        write_json_private(self.blob_path(&item), &sealed)?;

        self.storage.vault_items.upsert(item.clone())?;
        self.storage.vault_items.save()?;
        self.storage.log_create(&item)?;

        Ok(item)
    }

    /// Documents, newest first
    pub fn list(&self) -> MaterielResult<Vec<VaultItem>> {
        let mut items = self.storage.vault_items.get_all()?;
        items.reverse();
        Ok(items)
    }

    pub fn read(&self, key: &SecretKey, id: VaultItemId) -> MaterielResult<(VaultItem, Vec<u8>)> {
        let item = self.storage.vault_items.require(id)?;
        let sealed: EncryptedData = read_json_required(self.blob_path(&item))?;
        let content = decrypt(&sealed, key)?;
        Ok((item, content))
    }

    pub fn delete(&self, id: VaultItemId) -> MaterielResult<VaultItem> {
        let item = self.storage.vault_items.require(id)?;

        let blob = self.blob_path(&item);
        if blob.exists() {
            fs::remove_file(&blob)
                .map_err(|e| MaterielError::Io(format!("Failed to delete document: {}", e)))?;
        }

        self.storage.vault_items.delete(id)?;
        self.storage.vault_items.save()?;
        self.storage.log_delete(&item)?;

        Ok(item)
    }

    /// Delete every document and its metadata; returns how many were removed
    pub fn wipe_all(&self) -> MaterielResult<usize> {
        let items = self.storage.vault_items.get_all()?;
        for item in &items {
            self.delete(item.id)?;
        }

        // Blobs with no metadata left behind by an interrupted write
        let dir = self.storage.paths().documents_dir();
        if dir.exists() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_file() {
                    fs::remove_file(&path)?;
                }
            }
        }

        Ok(items.len())
    }
}
