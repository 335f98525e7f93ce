//! Single-file JSON statement store.
//!
//! The whole file is rewritten on every upsert through a temporary file
//! and a rename, so a failed write leaves the previous contents intact.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, StmtError};
use crate::model::statement::{StatementKey, StatementRecord};
use crate::store::{StatementStore, Upsert};

/// Default file name inside the data directory.
pub const STORE_FILE_NAME: &str = "statements.json";

/// Statement records persisted as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use the store file at `path`. The file is created on first upsert.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `<dir>/statements.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<StatementRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = std::fs::read(&self.path).map_err(|e| StmtError::io(&self.path, e))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| StmtError::json(&self.path, e))
    }

    fn save(&self, records: &[StatementRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StmtError::io(parent, e))?;
            }
        }

        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| StmtError::Store(format!("serializing records: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StmtError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StmtError::io(&self.path, e))?;
        debug!(path = %self.path.display(), count = records.len(), "Saved statement store");
        Ok(())
    }
}

impl StatementStore for JsonFileStore {
    fn upsert(&mut self, record: StatementRecord) -> Result<Upsert> {
        let mut records = self.load()?;
        let key = record.key();

        let outcome = match records.iter_mut().find(|r| r.key() == key) {
            Some(existing) => {
                *existing = record;
                Upsert::Replaced
            }
            None => {
                records.push(record);
                Upsert::Inserted
            }
        };
        records.sort_by_key(StatementRecord::key);

        self.save(&records)?;
        info!(
            email_id = %key.email_id,
            user_id = %key.user_id,
            outcome = ?outcome,
            "Stored statement"
        );
        Ok(outcome)
    }

    fn get(&self, key: &StatementKey) -> Result<Option<StatementRecord>> {
        Ok(self.load()?.into_iter().find(|r| &r.key() == key))
    }

    fn list(&self, user_id: &str) -> Result<Vec<StatementRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::record;

    #[test]
    fn test_upsert_roundtrip_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::in_dir(tmp.path().join("data"));

        assert_eq!(store.upsert(record("e2", "u", "two")).unwrap(), Upsert::Inserted);
        assert_eq!(store.upsert(record("e1", "u", "one")).unwrap(), Upsert::Inserted);
        assert_eq!(store.upsert(record("e2", "u", "two again")).unwrap(), Upsert::Replaced);

        let reopened = JsonFileStore::in_dir(tmp.path().join("data"));
        let listed = reopened.list("u").unwrap();
        let subjects: Vec<&str> = listed.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["one", "two again"]);
        assert!(!reopened.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(tmp.path());
        assert!(store.list("u").unwrap().is_empty());
        let key = StatementKey {
            email_id: "e".into(),
            user_id: "u".into(),
        };
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(STORE_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.list("u"), Err(StmtError::Json { .. })));
        assert!(store.upsert(record("e", "u", "s")).is_err());
        // The corrupt file is left as it was.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
