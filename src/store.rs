//! Persistent mapping from upstream incident ids to ServiceNow sys_ids
//!
//! The store decides create vs. update: a missing binding means the incident
//! has never been created downstream. Bindings are written once after a
//! successful create and never mutated, so a redundant close is a no-op.
//!
//! The file format is one `incidentID<TAB>sysId` record per line, LF
//! terminated, UTF-8. Readers tolerate a missing file and skip malformed
//! lines. Writers rewrite the whole file through a sibling temp file and an
//! atomic rename, holding a sibling advisory lockfile across the
//! read-then-write critical section.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{AlertError, Result};

/// How long a writer waits for the advisory lock before giving up
const LOCK_WAIT: Duration = Duration::from_secs(5);

/// Poll interval while waiting for the lock
const LOCK_POLL: Duration = Duration::from_millis(100);

/// Contract for the incident-id mapping
///
/// Tests substitute [`MemoryStore`]; production uses [`FileStore`].
pub trait IdStore: Send + Sync {
    /// Look up the sys_id previously stored for an upstream incident
    fn get(&self, incident_id: &str) -> Result<Option<String>>;

    /// Insert a new binding. First write wins: inserting over an existing
    /// binding leaves the stored value untouched.
    fn put(&self, incident_id: &str, sys_id: &str) -> Result<()>;
}

/// File-backed store surviving across one-shot invocations
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store over the given file path. The file itself is created
    /// lazily on the first `put`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse the store file into an ordered record list. A missing file is
    /// an empty store; malformed lines are skipped with a warning.
    fn load(&self) -> Result<Vec<(String, String)>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AlertError::store(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut records = Vec::new();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            match line.split_once('\t') {
                Some((incident_id, sys_id)) if !incident_id.is_empty() => {
                    records.push((incident_id.to_string(), sys_id.to_string()));
                }
                _ => warn!(
                    store = %self.path.display(),
                    "skipping malformed id-store line"
                ),
            }
        }
        Ok(records)
    }

    /// Rewrite the store atomically: temp file in the same directory, flush,
    /// then rename over the store path.
    fn persist(&self, records: &[(String, String)]) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        for (incident_id, sys_id) in records {
            writeln!(tmp, "{}\t{}", incident_id, sys_id)?;
        }
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            AlertError::store(format!("cannot replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Acquire the sibling lockfile, polling up to [`LOCK_WAIT`]
    fn acquire_lock(&self) -> Result<LockGuard> {
        let lock_path = self.lock_path();
        if let Some(dir) = lock_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let deadline = Instant::now() + LOCK_WAIT;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(_) => return Ok(LockGuard { path: lock_path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(AlertError::store(format!(
                            "could not acquire {} within {:?}",
                            lock_path.display(),
                            LOCK_WAIT
                        )));
                    }
                    std::thread::sleep(LOCK_POLL);
                }
                Err(e) => {
                    return Err(AlertError::store(format!(
                        "cannot create {}: {}",
                        lock_path.display(),
                        e
                    )))
                }
            }
        }
    }
}

impl IdStore for FileStore {
    fn get(&self, incident_id: &str) -> Result<Option<String>> {
        // Lock-free read: open, scan, close
        let records = self.load()?;
        Ok(records
            .into_iter()
            .find(|(id, _)| id == incident_id)
            .map(|(_, sys_id)| sys_id))
    }

    fn put(&self, incident_id: &str, sys_id: &str) -> Result<()> {
        let _lock = self.acquire_lock()?;

        let mut records = self.load()?;
        if records.iter().any(|(id, _)| id == incident_id) {
            debug!(incident_id, "id-store binding already present, keeping existing");
            return Ok(());
        }
        records.push((incident_id.to_string(), sys_id.to_string()));
        self.persist(&records)
    }
}

/// Deletes the lockfile when the critical section ends, on every exit path
struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), "failed to remove lockfile: {}", e);
        }
    }
}

/// In-memory store for tests
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdStore for MemoryStore {
    fn get(&self, incident_id: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| AlertError::store(e.to_string()))?;
        Ok(entries.get(incident_id).cloned())
    }

    fn put(&self, incident_id: &str, sys_id: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AlertError::store(e.to_string()))?;
        entries
            .entry(incident_id.to_string())
            .or_insert_with(|| sys_id.to_string());
        Ok(())
    }
}
