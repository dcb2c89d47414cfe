//! A single durable JSON document with locked read-modify-write.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::atomic::{read_json, write_json};
use crate::error::StorageResult;
use crate::lock::FileLock;

/// One JSON file, read via atomic snapshot, written under an exclusive
/// per-file lock. `T::default()` stands in for "file does not exist yet".
pub struct JsonDocument<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Bind to a document path without touching the filesystem.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// The bound path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read an atomic snapshot. Readers never block on the write lock:
    /// rename-based atomic writes mean a concurrent writer is either
    /// entirely visible or entirely not.
    pub fn load(&self) -> StorageResult<T> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    /// Acquire the per-file lock, load the current value, let `f` produce
    /// a new value, and persist it — all while the lock is held.
    pub fn update<F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(T) -> T,
    {
        let _lock = FileLock::acquire(&self.path)?;
        let current = read_json(&self.path)?.unwrap_or_default();
        let next = f(current);
        write_json(&self.path, &next)?;
        Ok(next)
    }

    /// Like [`Self::update`] but `f` may fail, in which case nothing is
    /// written.
    pub fn try_update<F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(T) -> StorageResult<T>,
    {
        let _lock = FileLock::acquire(&self.path)?;
        let current = read_json(&self.path)?.unwrap_or_default();
        let next = f(current)?;
        write_json(&self.path, &next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Counter {
        n: u32,
    }

    #[test]
    fn load_of_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Counter> = JsonDocument::new(dir.path().join("c.json"));
        assert_eq!(doc.load().unwrap(), Counter::default());
    }

    #[test]
    fn update_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let doc: JsonDocument<Counter> = JsonDocument::new(&path);
        doc.update(|c| Counter { n: c.n + 1 }).unwrap();
        doc.update(|c| Counter { n: c.n + 1 }).unwrap();

        let reopened: JsonDocument<Counter> = JsonDocument::new(&path);
        assert_eq!(reopened.load().unwrap(), Counter { n: 2 });
    }

    #[test]
    fn try_update_failure_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let doc: JsonDocument<Counter> = JsonDocument::new(&path);
        doc.update(|c| Counter { n: c.n + 1 }).unwrap();

        let result: StorageResult<Counter> = doc.try_update(|_| {
            Err(crate::error::StorageError::NotFound("nope".into()))
        });
        assert!(result.is_err());
        assert_eq!(doc.load().unwrap(), Counter { n: 1 });
    }
}
