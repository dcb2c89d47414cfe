//! Durable audit log: one NDJSON file per UTC date under
//! `logs/audit/<YYYY-MM-DD>.ndjson` (spec §6), hash-chained within the
//! day via [`AuditEntry::previous_hash`].
//!
//! Reworked from the teacher's `SurrealKvAuditStorage` (namespaced
//! key-value entries plus a session index) into append-only NDJSON: the
//! spec's durable layout is plain files, not an embedded database, and a
//! day's worth of entries is small enough that append + linear scan is
//! the simplest correct implementation.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use mh_crypto::ContentHash;
use mh_storage::FileLock;

use crate::entry::{Actor, AuditEntry, Category, Level};
use crate::error::{AuditError, AuditResult};

/// Durable, hash-chained audit log.
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    /// Open an audit log rooted at `audit_dir` (typically
    /// `AppRoot::system_logs_dir().join("audit")`). Does not create the
    /// directory until the first entry is appended.
    #[must_use]
    pub fn new(audit_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: audit_dir.into(),
        }
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.ndjson", date.format("%Y-%m-%d")))
    }

    /// Append one `category=action` or `category=security` entry (spec
    /// §4.D step 5). Chained onto the last entry written today, or
    /// [`ContentHash::zero`] if today's file doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the day file's lock cannot be acquired, or the
    /// file cannot be read or written.
    pub fn append(
        &self,
        category: Category,
        level: Level,
        event: impl Into<String>,
        actor: Actor,
        details: serde_json::Value,
    ) -> AuditResult<AuditEntry> {
        fs::create_dir_all(&self.dir)?;
        let path = self.day_path(Utc::now().date_naive());

        let _lock = FileLock::acquire(&path)?;

        let previous_hash = self
            .last_entry(&path)?
            .map(|e| e.content_hash())
            .unwrap_or_else(ContentHash::zero);

        let entry = AuditEntry::new(category, level, event, actor, details, previous_hash);
        self.append_line(&path, &entry)?;

        Ok(entry)
    }

    /// Convenience for `category=action`, `level=info`.
    ///
    /// # Errors
    ///
    /// See [`Self::append`].
    pub fn record_action(
        &self,
        event: impl Into<String>,
        actor: Actor,
        details: serde_json::Value,
    ) -> AuditResult<AuditEntry> {
        self.append(Category::Action, Level::Info, event, actor, details)
    }

    /// Convenience for `category=security`.
    ///
    /// # Errors
    ///
    /// See [`Self::append`].
    pub fn record_security(
        &self,
        level: Level,
        event: impl Into<String>,
        actor: Actor,
        details: serde_json::Value,
    ) -> AuditResult<AuditEntry> {
        self.append(Category::Security, level, event, actor, details)
    }

    /// All entries recorded on `date`, in file order. Empty if the day
    /// has no file yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read_day(&self, date: NaiveDate) -> AuditResult<Vec<AuditEntry>> {
        match fs::read_to_string(self.day_path(date)) {
            Ok(contents) => contents
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| serde_json::from_str(l).map_err(AuditError::from))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify that every entry in `date`'s file correctly chains onto the
    /// entry before it, and that the first entry of the day starts the
    /// chain from zero.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::IntegrityViolation`] describing the first
    /// break found, or a read/parse error if the file is unreadable.
    pub fn verify_chain(&self, date: NaiveDate) -> AuditResult<()> {
        let entries = self.read_day(date)?;
        let mut previous: Option<&AuditEntry> = None;
        for (idx, entry) in entries.iter().enumerate() {
            match previous {
                None if !entry.previous_hash.is_zero() => {
                    return Err(AuditError::IntegrityViolation {
                        date: date.to_string(),
                        line: idx + 1,
                        reason: "first entry of the day has a non-zero previous_hash".into(),
                    });
                }
                Some(prev) if !entry.follows(prev) => {
                    return Err(AuditError::IntegrityViolation {
                        date: date.to_string(),
                        line: idx + 1,
                        reason: "previous_hash does not match the preceding entry".into(),
                    });
                }
                _ => {}
            }
            previous = Some(entry);
        }
        Ok(())
    }

    fn last_entry(&self, path: &Path) -> AuditResult<Option<AuditEntry>> {
        match fs::read_to_string(path) {
            Ok(contents) => contents
                .lines()
                .filter(|l| !l.trim().is_empty())
                .last()
                .map(serde_json::from_str)
                .transpose()
                .map_err(AuditError::from),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn append_line(&self, path: &Path, entry: &AuditEntry) -> AuditResult<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(&line)?;
        file.sync_all()?;

        if let Some(parent) = path.parent() {
            fs::File::open(parent)?.sync_all()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mh_core::{Role, UserId};

    fn actor() -> Actor {
        Actor::user(UserId::new(), Role::Owner)
    }

    #[test]
    fn append_then_read_day_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path());

        log.record_action("profile.write", actor(), serde_json::json!({"path": "a"}))
            .unwrap();
        log.record_action("profile.write", actor(), serde_json::json!({"path": "b"}))
            .unwrap();

        let today = Utc::now().date_naive();
        let entries = log.read_day(today).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, "profile.write");
        assert!(entries[0].previous_hash.is_zero());
        assert_eq!(entries[1].previous_hash, entries[0].content_hash());
    }

    #[test]
    fn unwritten_day_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        let entries = log.read_day(Utc::now().date_naive()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn verify_chain_passes_for_untampered_day() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        for i in 0..5 {
            log.record_action(format!("event.{i}"), actor(), serde_json::json!({}))
                .unwrap();
        }
        assert!(log.verify_chain(Utc::now().date_naive()).is_ok());
    }

    #[test]
    fn verify_chain_detects_a_rewritten_entry() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        log.record_action("first", actor(), serde_json::json!({}))
            .unwrap();
        log.record_action("second", actor(), serde_json::json!({}))
            .unwrap();

        let today = Utc::now().date_naive();
        let path = log.day_path(today);
        let mut entries = log.read_day(today).unwrap();
        entries[0].event = "tampered".to_string();
        let rewritten: String = entries
            .iter()
            .map(|e| serde_json::to_string(e).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
            + "\n";
        fs::write(&path, rewritten).unwrap();

        let err = log.verify_chain(today).unwrap_err();
        assert!(matches!(err, AuditError::IntegrityViolation { .. }));
    }

    #[test]
    fn security_entries_use_the_security_category() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        let entry = log
            .record_security(
                Level::Warn,
                "auth.denied",
                Actor::anonymous(),
                serde_json::json!({"reason": "expired session"}),
            )
            .unwrap();
        assert_eq!(entry.category, Category::Security);
        assert_eq!(entry.level, Level::Warn);
    }
}
