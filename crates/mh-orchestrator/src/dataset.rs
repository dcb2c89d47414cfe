//! Reading and rejecting one dataset directory (spec §3 "Dataset Record").

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use mh_core::UserId;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::types::{AdapterArtifact, ApprovalRecord, DatasetRecord, EvalResult, RejectedRecord};

const INSTRUCTIONS_FILE: &str = "instructions.jsonl";
const APPROVED_FILE: &str = "approved.json";
const EVAL_FILE: &str = "eval.json";
const MODELFILE: &str = "Modelfile";
const SAFETENSORS_FILE: &str = "adapter_model.safetensors";
const GGUF_FILE: &str = "adapter.gguf";
const REJECTED_FILE: &str = "rejected.json";

impl DatasetRecord {
    /// Scan `dir` (typically `out/adapters/<date>/` under a profile root) and
    /// build a snapshot of its current pipeline state.
    ///
    /// # Errors
    /// Returns [`OrchestratorError::InvalidState`] if `approved.json` or
    /// `eval.json` exist but fail to parse.
    pub fn load(dir: &Path, date: NaiveDate) -> OrchestratorResult<Self> {
        let approval = read_optional::<ApprovalRecord>(&dir.join(APPROVED_FILE), date)?;
        let eval = read_optional::<EvalResult>(&dir.join(EVAL_FILE), date)?;

        let artifact = if dir.join(SAFETENSORS_FILE).is_file() {
            Some(AdapterArtifact::SafeTensors(dir.join(SAFETENSORS_FILE)))
        } else if dir.join(GGUF_FILE).is_file() {
            Some(AdapterArtifact::Gguf(dir.join(GGUF_FILE)))
        } else {
            None
        };

        Ok(Self {
            date,
            dir: dir.to_path_buf(),
            has_instructions: dir.join(INSTRUCTIONS_FILE).is_file(),
            approval,
            eval,
            artifact,
            has_modelfile: dir.join(MODELFILE).is_file(),
        })
    }

    /// Path to `instructions.jsonl` within this dataset.
    #[must_use]
    pub fn instructions_path(&self) -> PathBuf {
        self.dir.join(INSTRUCTIONS_FILE)
    }

    /// Count the training pairs currently in `instructions.jsonl` (one
    /// JSON object per non-empty line).
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read.
    pub fn count_pairs(&self) -> std::io::Result<u64> {
        let contents = std::fs::read_to_string(self.instructions_path())?;
        Ok(contents.lines().filter(|l| !l.trim().is_empty()).count() as u64)
    }

    /// Whether a sibling `adapters/_rejected/<date>/rejected.json` already exists
    /// for this date under `out_root` (the dataset was rejected in a
    /// prior run and is no longer eligible).
    #[must_use]
    pub fn is_rejected(out_root: &Path, date: NaiveDate) -> bool {
        rejected_marker_path(out_root, date).is_file()
    }
}

/// Read the reason recorded in `adapters/_rejected/<date>/rejected.json`, if the
/// dataset was rejected.
///
/// # Errors
/// Returns a storage error if the marker exists but cannot be parsed.
pub fn read_rejected_reason(out_root: &Path, date: NaiveDate) -> OrchestratorResult<String> {
    let record = read_optional::<RejectedRecord>(&rejected_marker_path(out_root, date), date)?;
    Ok(record.map(|r| r.reason).unwrap_or_default())
}

fn rejected_dir(out_root: &Path, date: NaiveDate) -> PathBuf {
    out_root
        .join("adapters")
        .join("_rejected")
        .join(date.format("%Y-%m-%d").to_string())
}

fn rejected_marker_path(out_root: &Path, date: NaiveDate) -> PathBuf {
    rejected_dir(out_root, date).join(REJECTED_FILE)
}

fn read_optional<T: serde::de::DeserializeOwned>(
    path: &Path,
    date: NaiveDate,
) -> OrchestratorResult<Option<T>> {
    mh_storage::read_json(path).map_err(|e| match e {
        mh_storage::StorageError::Serialization(err) => OrchestratorError::InvalidState {
            date: date.to_string(),
            reason: err.to_string(),
        },
        other => other.into(),
    })
}

/// Reject the dataset at `dataset_dir` (`out/adapters/<date>/`): move the whole
/// directory under `out/adapters/_rejected/<date>/` and write a `rejected.json`
/// marker (spec §3: "the dataset is no longer eligible for any later
/// step").
///
/// # Errors
/// Returns a storage or I/O error if the directory cannot be moved or the
/// marker cannot be written.
pub fn reject_dataset(
    out_root: &Path,
    date: NaiveDate,
    dataset_dir: &Path,
    reason: impl Into<String>,
    rejected_by: Option<UserId>,
) -> OrchestratorResult<PathBuf> {
    let target = rejected_dir(out_root, date);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::rename(dataset_dir, &target)?;

    let record = RejectedRecord {
        rejected_at: Utc::now(),
        rejected_by,
        reason: reason.into(),
    };
    mh_storage::write_json(&target.join(REJECTED_FILE), &record)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 26).unwrap()
    }

    #[test]
    fn empty_directory_reads_as_no_progress() {
        let dir = tempfile::tempdir().unwrap();
        let record = DatasetRecord::load(dir.path(), date()).unwrap();
        assert!(!record.has_instructions);
        assert!(record.approval.is_none());
        assert!(record.eval.is_none());
        assert!(record.artifact.is_none());
    }

    #[test]
    fn detects_every_artifact_and_marker_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INSTRUCTIONS_FILE), "{}\n{}\n").unwrap();
        std::fs::write(dir.path().join(GGUF_FILE), b"fake").unwrap();
        std::fs::write(dir.path().join(MODELFILE), "FROM base\n").unwrap();
        mh_storage::write_json(
            &dir.path().join(APPROVED_FILE),
            &ApprovalRecord {
                approved_at: Utc::now(),
                approved_by: None,
                notes: "ok".to_string(),
                pair_count: 2,
                auto_approved: true,
                dry_run: false,
            },
        )
        .unwrap();
        mh_storage::write_json(
            &dir.path().join(EVAL_FILE),
            &EvalResult {
                score: 0.9,
                passed: true,
            },
        )
        .unwrap();

        let record = DatasetRecord::load(dir.path(), date()).unwrap();
        assert!(record.has_instructions);
        assert!(record.has_modelfile);
        assert_eq!(record.artifact, Some(AdapterArtifact::Gguf(dir.path().join(GGUF_FILE))));
        assert!(record.eval.unwrap().passed);
        assert_eq!(record.count_pairs().unwrap(), 2);
    }

    #[test]
    fn reject_moves_directory_and_writes_marker() {
        let root = tempfile::tempdir().unwrap();
        let out_root = root.path().join("out");
        let dataset_dir = out_root.join("adapters").join(date().format("%Y-%m-%d").to_string());
        std::fs::create_dir_all(&dataset_dir).unwrap();
        std::fs::write(dataset_dir.join(INSTRUCTIONS_FILE), "{}\n").unwrap();

        assert!(!DatasetRecord::is_rejected(&out_root, date()));
        let target = reject_dataset(&out_root, date(), &dataset_dir, "bad data", None).unwrap();

        assert!(!dataset_dir.exists());
        assert!(target.join(INSTRUCTIONS_FILE).is_file());
        assert!(DatasetRecord::is_rejected(&out_root, date()));
    }
}
