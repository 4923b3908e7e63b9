//! Record store: the sole persistence gateway.
//!
//! The whole collection lives in one key-value slot as a JSON array and is
//! rewritten wholesale on every mutation. At this scale that is cheaper
//! than it sounds and keeps the caller's view atomic: read, mutate, write,
//! all within one event.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use thiserror::Error;

use crate::logging::{self, Domain};
use crate::record::{Record, RecordFields};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {id} not found")]
    NotFound { id: u64 },
    #[error(transparent)]
    Persist(#[from] anyhow::Error),
}

/// The persistence collaborator: a named slot of text. Everything above
/// this trait is storage-agnostic.
pub trait KvStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// SQLite-backed slot storage.
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("cannot open kv database at {}", path))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }
}

impl KvStore for SqliteKv {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-memory slot storage for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemKv {
    slots: HashMap<String, String>,
}

impl MemKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: &str, value: &str) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.to_string(), value.to_string());
        Self { slots }
    }
}

impl KvStore for MemKv {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub struct RecordStore<S: KvStore> {
    kv: S,
    key: String,
}

impl<S: KvStore> RecordStore<S> {
    pub fn new(kv: S, key: String) -> Self {
        Self { kv, key }
    }

    /// The full collection. Absent, unreadable or unparseable state
    /// degrades to empty - availability over surfacing a parse error.
    pub fn load_all(&self) -> Vec<Record> {
        let raw = match self.kv.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                logging::warn(Domain::Store, "load_failed", json!({ "error": err.to_string() }));
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                logging::warn(
                    Domain::Store,
                    "corrupt_collection",
                    json!({ "error": err.to_string(), "bytes": raw.len() }),
                );
                Vec::new()
            }
        }
    }

    pub fn create(&mut self, fields: RecordFields) -> Result<Record, StoreError> {
        let mut records = self.load_all();
        let id = next_id(&records);
        let record = Record::from_fields(id, Utc::now().to_rfc3339(), fields);
        records.push(record.clone());
        self.persist(&records)?;
        logging::info(Domain::Store, "record_created", json!({ "id": id }));
        Ok(record)
    }

    pub fn update(&mut self, id: u64, fields: RecordFields) -> Result<Record, StoreError> {
        let mut records = self.load_all();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { id })?;
        record.apply(fields);
        let updated = record.clone();
        self.persist(&records)?;
        logging::info(Domain::Store, "record_updated", json!({ "id": id }));
        Ok(updated)
    }

    pub fn delete(&mut self, id: u64) -> Result<(), StoreError> {
        let mut records = self.load_all();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound { id });
        }
        self.persist(&records)?;
        logging::info(Domain::Store, "record_deleted", json!({ "id": id }));
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<Record> {
        self.load_all().into_iter().find(|r| r.id == id)
    }

    fn persist(&mut self, records: &[Record]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(records)
            .context("serialize record collection")
            .map_err(StoreError::Persist)?;
        self.kv.save(&self.key, &raw).map_err(StoreError::Persist)
    }
}

/// Fresh identity: current Unix milliseconds, bumped past the collection
/// maximum so rapid successive creates can never collide.
fn next_id(records: &[Record]) -> u64 {
    let clock = Utc::now().timestamp_millis().max(0) as u64;
    let max = records.iter().map(|r| r.id).max().unwrap_or(0);
    if clock > max {
        clock
    } else {
        max + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AssemblyRequired;

    const KEY: &str = "turnaroundItems";

    fn fields(desc: &str) -> RecordFields {
        RecordFields {
            description: desc.to_string(),
            total_qty: 4,
            tracking_number: "TCN-9".to_string(),
            inspected_qty: 4,
            received_qc: Some("2024-03-05T09:00".to_string()),
            qc_start: Some("2024-03-05T09:30".to_string()),
            qc_finished: Some("2024-03-05T15:00".to_string()),
            assembly_required: AssemblyRequired::Yes,
        }
    }

    fn store() -> RecordStore<MemKv> {
        RecordStore::new(MemKv::new(), KEY.to_string())
    }

    #[test]
    fn test_create_then_load_round_trip() {
        let mut store = store();
        let created = store.create(fields("first")).unwrap();
        let all = store.load_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], created);
        assert!(created.id > 0);
        assert!(!created.created_at.is_empty());
    }

    #[test]
    fn test_ids_unique_under_rapid_creates() {
        let mut store = store();
        let mut ids = Vec::new();
        for i in 0..50 {
            ids.push(store.create(fields(&format!("item {}", i))).unwrap().id);
        }
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn test_update_preserves_identity_and_creation_time() {
        let mut store = store();
        let created = store.create(fields("orig")).unwrap();
        let updated = store.update(created.id, fields("changed")).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.description, "changed");
        assert_eq!(store.load_all()[0].description, "changed");
    }

    #[test]
    fn test_update_missing_id_is_not_found() {
        let mut store = store();
        store.create(fields("only")).unwrap();
        match store.update(999, fields("nope")) {
            Err(StoreError::NotFound { id }) => assert_eq!(id, 999),
            other => panic!("expected NotFound, got {:?}", other.map(|r| r.id)),
        }
        // The no-op left the collection untouched.
        assert_eq!(store.load_all()[0].description, "only");
    }

    #[test]
    fn test_delete_round_trip() {
        let mut store = store();
        let a = store.create(fields("a")).unwrap();
        let b = store.create(fields("b")).unwrap();
        store.delete(a.id).unwrap();
        let all = store.load_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, b.id);
        assert!(matches!(store.delete(a.id), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_corrupt_slot_degrades_to_empty() {
        let store = RecordStore::new(MemKv::with_slot(KEY, "{not json"), KEY.to_string());
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_corrupt_slot_is_recoverable_by_create() {
        let mut store = RecordStore::new(MemKv::with_slot(KEY, "[1,2,oops"), KEY.to_string());
        let created = store.create(fields("fresh")).unwrap();
        assert_eq!(store.load_all(), vec![created]);
    }

    #[test]
    fn test_get_by_id() {
        let mut store = store();
        let created = store.create(fields("findme")).unwrap();
        assert_eq!(store.get(created.id).unwrap().description, "findme");
        assert!(store.get(1).is_none());
    }
}
