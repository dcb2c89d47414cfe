//! The durable process-group pid file a cancel request reads back (spec
//! §4.H "Cancellation": "records its process-group id to a durable pid
//! file").

use std::path::{Path, PathBuf};

/// One step's recorded process group, overwritten as each step of a
/// cycle spawns its own child (spec §5: steps run sequentially, so only
/// one process group is ever live at a time per user).
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Bind to `logs/run/<username>-<date>.pid` under the installation
    /// root.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record the process group id of the step currently running.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be written.
    pub fn record(&self, pgid: u32) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, pgid.to_string())
    }

    /// Read the currently recorded process group, if any.
    ///
    /// # Errors
    /// Returns an I/O error other than "file not found", or if the
    /// contents aren't a valid pid.
    pub fn read(&self) -> std::io::Result<Option<u32>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the pid file (spec §4.H: "Always removes the pid file").
    /// A missing file is not an error.
    ///
    /// # Errors
    /// Returns an I/O error other than "file not found".
    pub fn remove(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// The bound path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = PidFile::new(dir.path().join("run/alice-2026-07-26.pid"));
        assert_eq!(pidfile.read().unwrap(), None);
        pidfile.record(4242).unwrap();
        assert_eq!(pidfile.read().unwrap(), Some(4242));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = PidFile::new(dir.path().join("run/alice.pid"));
        pidfile.remove().unwrap();
        pidfile.record(1).unwrap();
        pidfile.remove().unwrap();
        pidfile.remove().unwrap();
        assert_eq!(pidfile.read().unwrap(), None);
    }
}
