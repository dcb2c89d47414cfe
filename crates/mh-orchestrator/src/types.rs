//! Dataset and active-adapter shapes (spec §3 "Dataset Record", "Active
//! Adapter Record").

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use mh_core::UserId;
use serde::{Deserialize, Serialize};

/// A caller-supplied user context for one full cycle. Mirrors
/// `mh-agents::ProfileUser`'s shape; duplicated rather than shared so the
/// orchestrator stays independent of the scheduler crate.
#[derive(Debug, Clone)]
pub struct CycleUser {
    /// The user this cycle runs for.
    pub user_id: UserId,
    /// Username, used for the process-table cancellation fallback.
    pub username: String,
    /// Resolved profile root.
    pub profile_root: PathBuf,
}

/// `approved.json` (spec §4.H step 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// When the dataset was approved.
    pub approved_at: DateTime<Utc>,
    /// Who approved it. `None` only for a legacy/external record.
    pub approved_by: Option<UserId>,
    /// Free-form approval notes.
    pub notes: String,
    /// Number of training pairs in `instructions.jsonl` at approval time.
    pub pair_count: u64,
    /// Whether this approval was produced automatically.
    pub auto_approved: bool,
    /// Whether the run that produced this approval was a dry run.
    pub dry_run: bool,
}

/// `eval.json` (spec §4.H step 4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvalResult {
    /// The evaluation score.
    pub score: f64,
    /// Whether the adapter passed evaluation.
    pub passed: bool,
}

/// `rejected.json`, written when a dataset is rejected (spec §3 "Dataset
/// Record": "rejection moves the whole directory ... plus a
/// `rejected.json`").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// When the dataset was rejected.
    pub rejected_at: DateTime<Utc>,
    /// Who rejected it, if a user-initiated rejection.
    pub rejected_by: Option<UserId>,
    /// Human-readable rejection reason.
    pub reason: String,
}

/// Which of the two adapter artifact formats a dataset produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterArtifact {
    /// `adapter_model.safetensors`.
    SafeTensors(PathBuf),
    /// `adapter.gguf`.
    Gguf(PathBuf),
}

/// A read-only view over one `out/<date>/` directory's current state,
/// computed by scanning the files present rather than stored as a single
/// document (spec §3 "Dataset Record" is defined by file presence, not a
/// manifest).
#[derive(Debug, Clone)]
pub struct DatasetRecord {
    /// The dataset's date.
    pub date: NaiveDate,
    /// Absolute path to `out/<date>/`.
    pub dir: PathBuf,
    /// Whether `instructions.jsonl` exists.
    pub has_instructions: bool,
    /// The parsed `approved.json`, if present.
    pub approval: Option<ApprovalRecord>,
    /// The parsed `eval.json`, if present.
    pub eval: Option<EvalResult>,
    /// The adapter artifact produced, if training has completed.
    pub artifact: Option<AdapterArtifact>,
    /// Whether `Modelfile` exists.
    pub has_modelfile: bool,
}

/// Status field of the Active Adapter Record (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveAdapterStatus {
    /// A Modelfile was written but the local model server hasn't
    /// confirmed the load.
    ReadyForOllamaLoad,
    /// The model server confirmed the adapter is loaded.
    Loaded,
}

/// The two adapters referenced by a dual activation (spec §4.H step 5:
/// "historical-merged + recent").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterPair {
    /// Path to `out/adapters/history-merged/adapter-merged.gguf`.
    pub historical: PathBuf,
    /// Path to the current dataset's own adapter artifact.
    pub recent: PathBuf,
}

/// `out/active-adapter.json`: the currently staged or loaded adapter
/// (spec §3 "Active Adapter Record").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveAdapterRecord {
    /// The Ollama model name the Modelfile was registered under.
    pub model_name: String,
    /// Which dataset date produced this activation.
    pub dataset: NaiveDate,
    /// When activation ran.
    pub activated_at: DateTime<Utc>,
    /// Who triggered activation.
    pub activated_by: UserId,
    /// Current load status.
    pub status: ActiveAdapterStatus,
    /// The base model the Modelfile is built on.
    pub base_model: String,
    /// Path to the adapter artifact used.
    pub adapter_path: PathBuf,
    /// Path to a GGUF-converted adapter, if one was produced.
    pub gguf_adapter_path: Option<PathBuf>,
    /// Whether this activation references two adapters.
    pub is_dual_adapter: bool,
    /// The dual-adapter pair, present iff `is_dual_adapter`.
    pub adapters: Option<AdapterPair>,
}

/// Outcome of one [`crate::cycle::FullCycleOrchestrator::run`] call. A
/// cycle may legitimately pause for manual approval rather than fail.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The dataset is built and awaiting a manual `approved.json` write
    /// (auto-approval was off or this run was a dry run).
    AwaitingApproval,
    /// The cycle ran to completion and produced this activation record.
    Activated(ActiveAdapterRecord),
}
