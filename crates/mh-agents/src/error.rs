//! Agent registry/scheduler error types.

use thiserror::Error;

/// Errors from the registry and scheduler.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The durable registry or config document could not be read/written.
    #[error("storage error: {0}")]
    Storage(#[from] mh_storage::StorageError),

    /// A path could not be resolved through the storage router.
    #[error("router error: {0}")]
    Router(#[from] mh_router::RouterError),

    /// Appending an audit record failed.
    #[error("audit error: {0}")]
    Audit(#[from] mh_audit::AuditError),

    /// `registerAgent` called for a `(user, name)` pair that already has
    /// a live record (spec §4.F: "rejects duplicates").
    #[error("agent {name:?} is already running for this user")]
    DuplicateAgent {
        /// The agent name that collided.
        name: String,
    },

    /// The agent configuration document failed validation (spec §4.G:
    /// exactly one of `agentPath`/`task` must be set).
    #[error("invalid agent configuration for {name:?}: {reason}")]
    InvalidConfig {
        /// The offending agent's name.
        name: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A child process could not be spawned.
    #[error("failed to spawn agent {name:?}: {source}")]
    SpawnFailed {
        /// The agent name that failed to spawn.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The spawned agent never reported readiness within the bounded
    /// start-up window (spec §5: "the scheduler marks the launch
    /// failed").
    #[error("agent {name:?} did not become ready within {window_secs}s")]
    SpawnTimeout {
        /// The agent name that timed out.
        name: String,
        /// The configured start-up window, in seconds.
        window_secs: u64,
    },

    /// Sending a signal to a process failed for a reason other than the
    /// process already being gone.
    #[error("signal delivery to pid {pid} failed: {source}")]
    Signal {
        /// The target process id.
        pid: u32,
        /// Underlying errno.
        #[source]
        source: nix::errno::Errno,
    },
}

/// Result type for registry/scheduler operations.
pub type AgentResult<T> = Result<T, AgentError>;
