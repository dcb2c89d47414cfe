//! Full-cycle orchestrator error types.

use mh_core::ErrorKind;
use thiserror::Error;

/// Errors from the full-cycle pipeline.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The durable dataset or pid-file state could not be read/written.
    #[error("storage error: {0}")]
    Storage(#[from] mh_storage::StorageError),

    /// A path could not be resolved through the storage router.
    #[error("router error: {0}")]
    Router(#[from] mh_router::RouterError),

    /// Appending an audit record failed.
    #[error("audit error: {0}")]
    Audit(#[from] mh_audit::AuditError),

    /// A second full cycle was requested for a user that already has one
    /// in flight (spec §4.H "Concurrency").
    #[error("a full cycle is already running for this user")]
    AlreadyRunning,

    /// The dataset for the requested date was already rejected and is no
    /// longer eligible for any step (spec §3 "Dataset Record").
    #[error("dataset {date} was rejected: {reason}")]
    DatasetRejected {
        /// The rejected dataset's date.
        date: String,
        /// The recorded rejection reason.
        reason: String,
    },

    /// A pipeline step (`adapter-builder`, `lora-trainer`, `eval-adapter`)
    /// exited non-zero or could not be spawned.
    #[error("step {step:?} failed: {reason}")]
    StepFailed {
        /// Which pipeline step failed.
        step: String,
        /// Human-readable reason.
        reason: String,
    },

    /// `train` was attempted without a preceding `approved.json` (spec
    /// §4.H step 3: "Refuse to start without `approved.json`").
    #[error("dataset {date} has not been approved")]
    NotApproved {
        /// The dataset date.
        date: String,
    },

    /// `activate` was attempted but `eval.json` is missing or
    /// `passed != true` (spec §4.H step 5).
    #[error("dataset {date} has not passed evaluation")]
    EvalNotPassed {
        /// The dataset date.
        date: String,
    },

    /// Malformed dataset state on disk (e.g. `eval.json` present but not
    /// valid JSON for the expected shape).
    #[error("invalid dataset state for {date}: {reason}")]
    InvalidState {
        /// The dataset date.
        date: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl OrchestratorError {
    /// The stable error kind this maps to at the HTTP edge (spec §7).
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Storage(_) | Self::Router(_) | Self::Audit(_) => {
                ErrorKind::Internal
            }
            Self::AlreadyRunning => ErrorKind::Conflict,
            Self::DatasetRejected { .. } => ErrorKind::Conflict,
            Self::StepFailed { .. } => ErrorKind::Internal,
            Self::NotApproved { .. } | Self::EvalNotPassed { .. } => ErrorKind::Precondition,
            Self::InvalidState { .. } => ErrorKind::Validation,
        }
    }
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
