//! The incident store: a durable map from incident id to [`IncidentRecord`].
//!
//! Both implementations guard their map with a lock so the reconciler and
//! the interaction server can share one store. Upserts are checked against
//! the existing record: artifact ids may never change, and `updated_at` may
//! never move backwards.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use super::snapshot::{SnapshotError, StoreSnapshot, save_snapshot_atomic, try_load_snapshot};
use crate::types::{Artifacts, IncidentId, IncidentRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("incident store lock poisoned")]
    Poisoned,

    #[error("artifacts of incident {incident_id} are immutable: stored {stored:?}, got {proposed:?}")]
    ArtifactsChanged {
        incident_id: IncidentId,
        stored: Artifacts,
        proposed: Artifacts,
    },

    #[error("updated_at of incident {incident_id} would move backwards from {stored} to {proposed}")]
    TimeRegression {
        incident_id: IncidentId,
        stored: DateTime<Utc>,
        proposed: DateTime<Utc>,
    },
}

/// Durable incident records.
pub trait IncidentStore: Send + Sync {
    fn get(&self, id: &IncidentId) -> Result<Option<IncidentRecord>, StoreError>;

    /// Inserts a new record or replaces the existing one. Durable on return.
    fn upsert(&self, record: IncidentRecord) -> Result<(), StoreError>;

    fn exists(&self, id: &IncidentId) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_some())
    }
}

impl<S: IncidentStore + ?Sized> IncidentStore for Arc<S> {
    fn get(&self, id: &IncidentId) -> Result<Option<IncidentRecord>, StoreError> {
        (**self).get(id)
    }

    fn upsert(&self, record: IncidentRecord) -> Result<(), StoreError> {
        (**self).upsert(record)
    }

    fn exists(&self, id: &IncidentId) -> Result<bool, StoreError> {
        (**self).exists(id)
    }
}

fn check_replacement(
    existing: Option<&IncidentRecord>,
    proposed: &IncidentRecord,
) -> Result<(), StoreError> {
    let Some(existing) = existing else {
        return Ok(());
    };

    if existing.artifacts() != proposed.artifacts() {
        return Err(StoreError::ArtifactsChanged {
            incident_id: proposed.incident_id().clone(),
            stored: existing.artifacts(),
            proposed: proposed.artifacts(),
        });
    }

    if proposed.updated_at() < existing.updated_at() {
        return Err(StoreError::TimeRegression {
            incident_id: proposed.incident_id().clone(),
            stored: existing.updated_at(),
            proposed: proposed.updated_at(),
        });
    }

    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Poisoned)
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read().map_err(|_| StoreError::Poisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write().map_err(|_| StoreError::Poisoned)
}

/// A store backed by a JSON snapshot file.
///
/// Every upsert rewrites the whole snapshot synchronously, which assumes the
/// store stays small (one record per incident the page lists). Writers are
/// serialised by `writer`; the map itself is only locked to copy it and to
/// swap in the new version, so reads never wait on disk I/O.
#[derive(Debug)]
pub struct FileIncidentStore {
    path: PathBuf,
    writer: Mutex<()>,
    records: RwLock<BTreeMap<IncidentId, IncidentRecord>>,
}

impl FileIncidentStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match try_load_snapshot(&path)? {
            Some(snapshot) => {
                info!(path = %path.display(), incidents = snapshot.incidents.len(), "Loaded incident store");
                snapshot.incidents
            }
            None => {
                info!(path = %path.display(), "No incident store found, starting empty");
                BTreeMap::new()
            }
        };

        Ok(FileIncidentStore {
            path,
            writer: Mutex::new(()),
            records: RwLock::new(records),
        })
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(read(&self.records)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl IncidentStore for FileIncidentStore {
    fn get(&self, id: &IncidentId) -> Result<Option<IncidentRecord>, StoreError> {
        Ok(read(&self.records)?.get(id).cloned())
    }

    fn upsert(&self, record: IncidentRecord) -> Result<(), StoreError> {
        let _writer = lock(&self.writer)?;

        let mut next = {
            let records = read(&self.records)?;
            check_replacement(records.get(record.incident_id()), &record)?;
            records.clone()
        };
        let id = record.incident_id().clone();
        next.insert(id.clone(), record);

        // Memory only changes once the file is durable.
        save_snapshot_atomic(&self.path, &StoreSnapshot::new(next.clone()))?;
        *write(&self.records)? = next;

        debug!(incident_id = %id, "Persisted incident record");
        Ok(())
    }
}

/// A volatile store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryIncidentStore {
    records: Mutex<BTreeMap<IncidentId, IncidentRecord>>,
}

impl MemoryIncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.records)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl IncidentStore for MemoryIncidentStore {
    fn get(&self, id: &IncidentId) -> Result<Option<IncidentRecord>, StoreError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn upsert(&self, record: IncidentRecord) -> Result<(), StoreError> {
        let mut records = lock(&self.records)?;
        check_replacement(records.get(record.incident_id()), &record)?;
        records.insert(record.incident_id().clone(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IncidentStatus, MessageId, RoleId, ThreadId};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap()
    }

    fn record(id: &str, at: DateTime<Utc>) -> IncidentRecord {
        IncidentRecord::new(
            id.into(),
            Artifacts {
                role_id: RoleId::new(10),
                message_id: MessageId::new(20),
                thread_id: ThreadId::new(30),
            },
            IncidentStatus::Investigating,
            at,
        )
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("incidents.json");

        {
            let store = FileIncidentStore::open(&path).unwrap();
            assert!(store.is_empty().unwrap());
            store.upsert(record("a", t(1))).unwrap();
            store.upsert(record("b", t(2))).unwrap();
        }

        let reopened = FileIncidentStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 2);
        assert_eq!(reopened.get(&"a".into()).unwrap(), Some(record("a", t(1))));
        assert!(reopened.exists(&"b".into()).unwrap());
        assert!(!reopened.exists(&"c".into()).unwrap());
    }

    #[test]
    fn reads_do_not_wait_for_an_in_flight_write() {
        let dir = tempdir().unwrap();
        let store = FileIncidentStore::open(dir.path().join("incidents.json")).unwrap();
        store.upsert(record("a", t(1))).unwrap();

        // A writer holding its lock (as during the snapshot write) leaves
        // the records readable.
        let _writer = store.writer.lock().unwrap();
        assert_eq!(store.get(&"a".into()).unwrap(), Some(record("a", t(1))));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn upsert_replaces_existing_record() {
        let store = MemoryIncidentStore::new();
        store.upsert(record("a", t(1))).unwrap();

        let mut updated = record("a", t(1));
        updated.observe(IncidentStatus::Resolved, t(3));
        store.upsert(updated.clone()).unwrap();

        assert_eq!(store.get(&"a".into()).unwrap(), Some(updated));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn upsert_rejects_changed_artifacts() {
        let store = MemoryIncidentStore::new();
        store.upsert(record("a", t(1))).unwrap();

        let other = IncidentRecord::new(
            "a".into(),
            Artifacts {
                role_id: RoleId::new(11),
                message_id: MessageId::new(20),
                thread_id: ThreadId::new(30),
            },
            IncidentStatus::Investigating,
            t(2),
        );

        assert!(matches!(
            store.upsert(other),
            Err(StoreError::ArtifactsChanged { .. })
        ));
    }

    #[test]
    fn upsert_rejects_time_regression() {
        let dir = tempdir().unwrap();
        let store = FileIncidentStore::open(dir.path().join("incidents.json")).unwrap();
        store.upsert(record("a", t(5))).unwrap();

        assert!(matches!(
            store.upsert(record("a", t(4))),
            Err(StoreError::TimeRegression { .. })
        ));
        assert_eq!(store.get(&"a".into()).unwrap().unwrap().updated_at(), t(5));
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("incidents.json");
        let store = FileIncidentStore::open(&path).unwrap();
        std::fs::create_dir_all(path.join("blocker")).unwrap();

        assert!(store.upsert(record("a", t(1))).is_err());
        assert!(!store.exists(&"a".into()).unwrap());
    }

    #[test]
    fn corrupt_file_fails_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("incidents.json");
        std::fs::write(&path, b"garbage").unwrap();

        assert!(matches!(
            FileIncidentStore::open(&path),
            Err(StoreError::Snapshot(SnapshotError::Json(_)))
        ));
    }
}
