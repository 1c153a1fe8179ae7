//! Append-only JSONL audit logger

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{MaterielError, MaterielResult};

use super::entry::{AuditEntry, EntityType};

/// Writes audit entries to the log, one JSON object per line
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append an entry and flush it immediately
    pub fn log(&self, entry: &AuditEntry) -> MaterielResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| MaterielError::Io(format!("Failed to open audit log: {}", e)))?;

        let json = serde_json::to_string(entry)
            .map_err(|e| MaterielError::Json(format!("Failed to serialize audit entry: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| MaterielError::Io(format!("Failed to write audit entry: {}", e)))?;

        file.flush()
            .map_err(|e| MaterielError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// All entries, oldest first
    ///
    /// A truncated last line, left by a crash in the middle of an append,
    /// is skipped with a warning; a bad line anywhere else is an error.
    pub fn read_all(&self) -> MaterielResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| MaterielError::Io(format!("Failed to open audit log: {}", e)))?;

        let lines: Vec<String> = BufReader::new(file)
            .lines()
            .collect::<Result<_, _>>()
            .map_err(|e| MaterielError::Io(format!("Failed to read audit log: {}", e)))?;
        let last = lines.iter().rposition(|l| !l.trim().is_empty());

        let mut entries = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) if Some(index) == last => {
                    tracing::warn!(line = index + 1, error = %e, "skipping truncated audit entry");
                }
                Err(e) => {
                    return Err(MaterielError::Json(format!(
                        "Failed to parse audit entry at line {}: {}",
                        index + 1,
                        e
                    )))
                }
            }
        }

        Ok(entries)
    }

    /// The `count` most recent entries, oldest first
    pub fn read_recent(&self, count: usize) -> MaterielResult<Vec<AuditEntry>> {
        self.read_recent_of(None, count)
    }

    /// The `count` most recent entries about one kind of record, oldest first
    pub fn read_recent_of(
        &self,
        entity_type: Option<EntityType>,
        count: usize,
    ) -> MaterielResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        if let Some(entity_type) = entity_type {
            entries.retain(|e| e.entity_type == entity_type);
        }
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::Operation;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        (logger, temp_dir)
    }

    #[test]
    fn test_log_and_read() {
        let (logger, _temp) = create_test_logger();
        let entry = AuditEntry::create(
            EntityType::Person,
            "per-1",
            Some("Lea".to_string()),
            &json!({"name": "Lea"}),
        );

        logger.log(&entry).unwrap();

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[0].entity_type, EntityType::Person);
    }

    #[test]
    fn test_empty_log() {
        let (logger, _temp) = create_test_logger();
        assert!(logger.read_all().unwrap().is_empty());
        assert!(logger.read_recent(5).unwrap().is_empty());
    }

    #[test]
    fn test_read_recent() {
        let (logger, _temp) = create_test_logger();
        for i in 0..10 {
            let entry = AuditEntry::create(
                EntityType::Article,
                format!("art-{}", i),
                None,
                &json!({"index": i}),
            );
            logger.log(&entry).unwrap();
        }

        let recent = logger.read_recent(3).unwrap();
        let ids: Vec<_> = recent.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["art-7", "art-8", "art-9"]);
    }

    #[test]
    fn test_survives_restart() {
        let (logger, temp) = create_test_logger();
        logger
            .log(&AuditEntry::delete(EntityType::Loan, "loan-1", None, &json!({})))
            .unwrap();

        let reopened = AuditLogger::new(temp.path().join("audit.log"));
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_read_recent_of_one_kind() {
        let (logger, _temp) = create_test_logger();
        logger
            .log(&AuditEntry::create(EntityType::Material, "mat-1", None, &json!({})))
            .unwrap();
        logger
            .log(&AuditEntry::create(EntityType::Person, "per-1", None, &json!({})))
            .unwrap();
        logger
            .log(&AuditEntry::create(EntityType::Material, "mat-2", None, &json!({})))
            .unwrap();

        let materials = logger.read_recent_of(Some(EntityType::Material), 10).unwrap();
        let ids: Vec<_> = materials.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["mat-1", "mat-2"]);
    }

    #[test]
    fn test_truncated_last_line_is_skipped() {
        let (logger, temp) = create_test_logger();
        logger
            .log(&AuditEntry::create(EntityType::Article, "art-1", None, &json!({})))
            .unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(temp.path().join("audit.log"))
            .unwrap();
        write!(file, "{{\"timestamp\": \"2025-").unwrap();

        assert_eq!(logger.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_middle_line_is_an_error() {
        let (logger, temp) = create_test_logger();
        std::fs::write(temp.path().join("audit.log"), "garbage\n").unwrap();
        logger
            .log(&AuditEntry::create(EntityType::Article, "art-1", None, &json!({})))
            .unwrap();

        assert!(logger.read_all().is_err());
    }
}
