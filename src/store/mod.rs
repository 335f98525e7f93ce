//! Statement persistence: keyed upserts on `(email_id, user_id)`.

pub mod json;

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::statement::{StatementKey, StatementRecord};

pub use json::JsonFileStore;

/// Whether an upsert created a record or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// A persistence collaborator holding at most one record per key.
pub trait StatementStore {
    /// Insert or fully replace the record with the same key.
    fn upsert(&mut self, record: StatementRecord) -> Result<Upsert>;

    fn get(&self, key: &StatementKey) -> Result<Option<StatementRecord>>;

    /// All records for `user_id`, ordered by email id.
    fn list(&self, user_id: &str) -> Result<Vec<StatementRecord>>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<StatementKey, StatementRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StatementStore for MemoryStore {
    fn upsert(&mut self, record: StatementRecord) -> Result<Upsert> {
        Ok(match self.records.insert(record.key(), record) {
            Some(_) => Upsert::Replaced,
            None => Upsert::Inserted,
        })
    }

    fn get(&self, key: &StatementKey) -> Result<Option<StatementRecord>> {
        Ok(self.records.get(key).cloned())
    }

    fn list(&self, user_id: &str) -> Result<Vec<StatementRecord>> {
        Ok(self
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::model::transaction::CategoryTotals;

    pub(crate) fn record(email_id: &str, user_id: &str, subject: &str) -> StatementRecord {
        StatementRecord {
            email_id: email_id.into(),
            user_id: user_id.into(),
            subject: subject.into(),
            from_address: "bank@example.com".into(),
            date: DateTime::parse_from_rfc3339("2024-04-01T10:00:00+00:00").unwrap(),
            body_text: String::new(),
            transactions: Vec::new(),
            category_totals: CategoryTotals::new(),
            created_at: Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_upsert_replaces_same_key() {
        let mut store = MemoryStore::new();
        assert_eq!(store.upsert(record("e1", "u1", "first")).unwrap(), Upsert::Inserted);
        assert_eq!(store.upsert(record("e1", "u1", "second")).unwrap(), Upsert::Replaced);
        assert_eq!(store.len(), 1);

        let key = StatementKey {
            email_id: "e1".into(),
            user_id: "u1".into(),
        };
        assert_eq!(store.get(&key).unwrap().unwrap().subject, "second");
    }

    #[test]
    fn test_same_email_different_users() {
        let mut store = MemoryStore::new();
        store.upsert(record("e1", "u1", "s")).unwrap();
        store.upsert(record("e1", "u2", "s")).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.list("u1").unwrap().len(), 1);
        assert!(store.list("u3").unwrap().is_empty());
    }
}
