//! Key repository abstraction and the built-in implementations.
//!
//! A repository stores wrapped key records durably. `insert` is a
//! conditional write: it fails with [`KeyRingError::Conflict`] when the id
//! already exists, which is the mutual-exclusion primitive the rotation
//! logic relies on across processes. `update` exists only to persist the
//! revocation flag.

use crate::error::{KeyRingError, KeyRingResult};
use crate::key::KeyRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Durable storage for serialized key records.
pub trait KeyRepository: Send + Sync {
    /// Returns every stored record, in no particular order.
    fn list(&self) -> KeyRingResult<Vec<KeyRecord>>;

    /// Stores a new record. Fails with [`KeyRingError::Conflict`] if a
    /// record with the same id already exists.
    fn insert(&self, record: &KeyRecord) -> KeyRingResult<()>;

    /// Replaces an existing record (revocation only). Fails with
    /// [`KeyRingError::NotFound`] if the id is unknown.
    fn update(&self, record: &KeyRecord) -> KeyRingResult<()>;
}

/// In-memory repository for tests and ephemeral hosts.
#[derive(Default)]
pub struct MemoryKeyRepository {
    records: Mutex<BTreeMap<Uuid, KeyRecord>>,
    unavailable: AtomicBool,
}

impl MemoryKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault injection: while set, every operation fails as unavailable.
    /// Used to exercise the manager's stale-ring fallback.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> KeyRingResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(KeyRingError::RepositoryUnavailable(
                "memory repository marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Uuid, KeyRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyRepository for MemoryKeyRepository {
    fn list(&self) -> KeyRingResult<Vec<KeyRecord>> {
        self.check_available()?;
        Ok(self.lock().values().cloned().collect())
    }

    fn insert(&self, record: &KeyRecord) -> KeyRingResult<()> {
        self.check_available()?;
        let mut records = self.lock();
        if records.contains_key(&record.id) {
            return Err(KeyRingError::Conflict(record.id));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    fn update(&self, record: &KeyRecord) -> KeyRingResult<()> {
        self.check_available()?;
        let mut records = self.lock();
        if !records.contains_key(&record.id) {
            return Err(KeyRingError::NotFound(record.id));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }
}

/// Filesystem repository: one JSON file per key under a directory.
///
/// Conflict semantics come from `create_new` (the filesystem's own
/// conditional create), so two processes sharing the directory race safely.
/// Updates go through a temp file and rename.
pub struct FileKeyRepository {
    dir: PathBuf,
}

impl FileKeyRepository {
    /// Opens the repository, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> KeyRingResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("key-{id}.json"))
    }

    fn read_record(path: &Path) -> KeyRingResult<KeyRecord> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl KeyRepository for FileKeyRepository {
    fn list(&self) -> KeyRingResult<Vec<KeyRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                records.push(Self::read_record(&path)?);
            }
        }
        Ok(records)
    }

    fn insert(&self, record: &KeyRecord) -> KeyRingResult<()> {
        let path = self.record_path(record.id);
        let json = serde_json::to_vec_pretty(record)?;
        let result = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path);
        match result {
            Ok(mut file) => {
                use std::io::Write;
                file.write_all(&json)?;
                file.sync_all()?;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(KeyRingError::Conflict(record.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update(&self, record: &KeyRecord) -> KeyRingResult<()> {
        let path = self.record_path(record.id);
        if !path.exists() {
            return Err(KeyRingError::NotFound(record.id));
        }
        let json = serde_json::to_vec_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
