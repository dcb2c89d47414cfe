//! The fixed operation taxonomy the decision table is built on (spec §4.C).

use serde::{Deserialize, Serialize};

/// A gated kind of action. Every HTTP handler and scheduled job names one
/// of these before calling [`crate::check`]; there is no catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Reading data that isn't gated to a specific profile.
    ReadPublic,
    /// Reading data under the acting user's own profile.
    ReadProfile,
    /// Writing data under the acting user's own profile.
    WriteProfile,
    /// Changing system or per-user configuration.
    MutateConfig,
    /// Registering or starting a new agent.
    StartAgent,
    /// Launching a full-cycle training/eval/activate run (spec §4.H).
    RunOperator,
    /// Creating or deleting another user's account.
    ManageUsers,
}
