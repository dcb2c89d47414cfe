//! Single-writer per-file locking (spec §5: "writes to the same profile
//! file are serialized (per-file lock)").
//!
//! A [`FileLock`] guards one logical JSON document. Writers hold an
//! exclusive advisory lock on a `.lock` sidecar for the duration of a
//! read-modify-write; readers take atomic snapshots (a plain read never
//! blocks on the lock).

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{StorageError, StorageResult};

/// An exclusive advisory lock on the `.lock` sidecar of a document path.
/// Released when dropped.
pub struct FileLock {
    _file: File,
}

impl FileLock {
    /// Block until the exclusive lock on `doc_path`'s sidecar is acquired.
    pub fn acquire(doc_path: &Path) -> StorageResult<Self> {
        let lock_path = sidecar_path(doc_path);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        file.lock_exclusive()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(Self { _file: file })
    }
}

fn sidecar_path(doc_path: &Path) -> PathBuf {
    let file_name = doc_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "doc".to_string());
    doc_path.with_file_name(format!(".{file_name}.lock"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn same_path_serializes_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc.json");
        let counter = Arc::new(AtomicU32::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let doc = doc.clone();
            let counter = counter.clone();
            handles.push(std::thread::spawn(move || {
                let _lock = FileLock::acquire(&doc).unwrap();
                let before = counter.fetch_add(1, Ordering::SeqCst);
                // If two threads were ever inside the critical section at
                // once, this sleep would let a second increment land
                // before the first thread's value below is observed.
                std::thread::sleep(std::time::Duration::from_millis(2));
                assert_eq!(counter.load(Ordering::SeqCst), before + 1);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }
}
