//! Commonly used types for convenient import.
//!
//! Use `use mh_orchestrator::prelude::*;` to import all essential types.

pub use crate::cancel::CancelOutcome;
pub use crate::cycle::{FullCycleOrchestrator, RunOptions};
pub use crate::error::{OrchestratorError, OrchestratorResult};
pub use crate::model_server::{HttpModelServerClient, ModelServerClient, NullModelServerClient};
pub use crate::types::{
    ActiveAdapterRecord, ActiveAdapterStatus, AdapterArtifact, AdapterPair, ApprovalRecord,
    CycleOutcome, CycleUser, DatasetRecord, EvalResult, RejectedRecord,
};
