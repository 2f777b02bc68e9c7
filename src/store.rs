// Whole-collection JSON document store

use crate::config::Config;
use crate::error::{Result, TaskError};
use crate::record::{self, Record};
use fs2::FileExt;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const INDENT: &[u8] = b"    ";

/// Durable storage for one collection, kept as a single JSON array.
///
/// Every write replaces the whole document. Nothing is cached between
/// calls; each read goes back to disk.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

/// Exclusive advisory lock on a store, released on drop
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
}

impl Store {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tasks_path.clone())
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the sidecar file used for locking
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("tasks.json"));
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Read the whole collection
    ///
    /// A missing document is created holding an empty collection. An empty
    /// or whitespace-only document is an empty collection.
    pub fn read_all<T: Record>(&self) -> Result<Vec<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = ?self.path, "Task file not found, creating empty collection");
                let empty = render::<T>(&[]).map_err(|e| TaskError::read(&self.path, e))?;
                self.write_atomic(&empty)
                    .map_err(|e| TaskError::read(&self.path, e))?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(TaskError::read(&self.path, e)),
        };

        if content.trim().is_empty() {
            debug!(path = ?self.path, "Task file is empty");
            return Ok(Vec::new());
        }

        let records: Vec<T> = serde_json::from_str(&content).map_err(|e| TaskError::read(&self.path, e))?;
        debug!(path = ?self.path, count = records.len(), "Loaded collection");
        Ok(records)
    }

    /// Replace the whole collection
    pub fn write_all<T: Record>(&self, records: &[T]) -> Result<()> {
        let document = render(records).map_err(|e| TaskError::write(&self.path, e))?;
        self.write_atomic(&document)
            .map_err(|e| TaskError::write(&self.path, e))?;
        debug!(path = ?self.path, count = records.len(), "Wrote collection");
        Ok(())
    }

    /// Persist a single record: read everything, upsert by id, write back
    pub fn save<T: Record>(&self, record: T) -> Result<()> {
        let mut records: Vec<T> = self.read_all()?;
        debug!(id = record.id(), updated_at = %record.updated_at(), "Saving record");
        record::upsert(&mut records, record);
        self.write_all(&records)
    }

    /// Block until this process holds the store's write lock
    pub fn lock(&self) -> Result<StoreLock> {
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| TaskError::write(&lock_path, e))?;

        file.lock_exclusive().map_err(|e| TaskError::write(&lock_path, e))?;
        debug!(path = ?lock_path, "Acquired store lock");

        Ok(StoreLock { _file: file })
    }

    /// Write to a temp file in the same directory, then rename over the
    /// target so readers see either the old or the new document.
    ///
    /// A symlinked document is written through to the file it points at,
    /// an existing document keeps its permissions, and a read-only one is
    /// refused.
    fn write_atomic(&self, data: &[u8]) -> io::Result<()> {
        let target = match fs::canonicalize(&self.path) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.path.clone(),
            Err(e) => return Err(e),
        };

        let permissions = match fs::metadata(&target) {
            Ok(meta) if meta.permissions().readonly() => {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "task file is read-only"));
            }
            Ok(meta) => Some(meta.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(data)?;
        if let Some(permissions) = permissions {
            temp.as_file().set_permissions(permissions)?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&target).map_err(|e| e.error)?;

        Ok(())
    }
}

/// Serialize with 4-space indentation and no trailing newline
fn render<T: Serialize>(records: &[T]) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    records.serialize(&mut serializer)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{Status, Task};
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn store_in(temp: &TempDir) -> Store {
        Store::new(temp.path().join("tasks.json"))
    }

    #[test]
    fn test_read_missing_file_creates_empty_collection() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let tasks: Vec<Task> = store.read_all().unwrap();

        assert!(tasks.is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[test]
    fn test_read_whitespace_only_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::write(store.path(), "  \n\t \n").unwrap();

        let tasks: Vec<Task> = store.read_all().unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_read_malformed_is_read_error() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::write(store.path(), "{not json").unwrap();

        let err = store.read_all::<Task>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Read);
    }

    #[test]
    fn test_read_unopenable_is_read_error() {
        let temp = TempDir::new().unwrap();
        let store = Store::new(temp.path());

        let err = store.read_all::<Task>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Read);
    }

    #[test]
    fn test_write_unwritable_is_write_error() {
        let temp = TempDir::new().unwrap();
        let store = Store::new(temp.path().join("missing-dir").join("tasks.json"));

        let err = store.write_all(&[Task::new("1", "a", at(0))]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
    }

    #[test]
    fn test_write_format() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.write_all(&[Task::new("1", "café ☕", at(1_700_000_000))]).unwrap();

        let expected = r#"[
    {
        "id": "1",
        "description": "café ☕",
        "status": "todo",
        "createdAt": "2023-11-14T22:13:20.000000Z",
        "updatedAt": "2023-11-14T22:13:20.000000Z"
    }
]"#;
        assert_eq!(fs::read_to_string(store.path()).unwrap(), expected);
    }

    #[test]
    fn test_round_trip_is_byte_stable() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let mut done = Task::new("2", "ship it", at(1_700_000_100));
        done.status = Status::Done;
        done.updated_at = at(1_700_000_200);
        store
            .write_all(&[Task::new("1", "naïve plan", at(1_700_000_000)), done])
            .unwrap();
        let before = fs::read(store.path()).unwrap();

        let tasks: Vec<Task> = store.read_all().unwrap();
        store.write_all(&tasks).unwrap();

        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_reads_legacy_offsetless_timestamps() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::write(
            store.path(),
            r#"[
    {
        "id": "1",
        "description": "legacy",
        "status": "in-progress",
        "createdAt": "2024-05-01T08:00:00.123456",
        "updatedAt": "2024-05-02T09:30:00.654321"
    }
]"#,
        )
        .unwrap();

        let tasks: Vec<Task> = store.read_all().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, Status::InProgress);
        assert_eq!(tasks[0].created_at.to_rfc3339(), "2024-05-01T08:00:00.123456+00:00");
    }

    #[test]
    fn test_save_upserts_in_place() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.save(Task::new("1", "a", at(0))).unwrap();
        store.save(Task::new("2", "b", at(1))).unwrap();

        let mut changed = Task::new("1", "a2", at(0));
        changed.updated_at = at(5);
        store.save(changed.clone()).unwrap();
        store.save(changed).unwrap();

        let tasks: Vec<Task> = store.read_all().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "1");
        assert_eq!(tasks[0].description, "a2");
        assert_eq!(tasks[1].id, "2");
    }

    #[test]
    fn test_write_refuses_read_only_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.write_all(&[Task::new("1", "a", at(0))]).unwrap();
        let before = fs::read(store.path()).unwrap();

        let mut perms = fs::metadata(store.path()).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(store.path(), perms).unwrap();

        let err = store.write_all(&[Task::new("2", "b", at(1))]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.write_all::<Task>(&[]).unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.save(Task::new("1", "a", at(0))).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_symlink() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real.json");
        fs::write(&real, "[]").unwrap();
        let store = store_in(&temp);
        std::os::unix::fs::symlink(&real, store.path()).unwrap();

        store.save(Task::new("1", "a", at(0))).unwrap();

        assert!(fs::symlink_metadata(store.path()).unwrap().file_type().is_symlink());
        let tasks: Vec<Task> = serde_json::from_str(&fs::read_to_string(&real).unwrap()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "1");
    }

    #[test]
    fn test_lock_creates_sidecar() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let lock = store.lock().unwrap();
        assert_eq!(store.lock_path(), temp.path().join("tasks.json.lock"));
        assert!(store.lock_path().exists());
        drop(lock);

        // Re-acquirable once released
        let _lock = store.lock().unwrap();
    }

    #[test]
    fn test_relative_path_lock_name() {
        let store = Store::new("tasks.json");
        assert_eq!(store.lock_path(), PathBuf::from("tasks.json.lock"));
    }
}
