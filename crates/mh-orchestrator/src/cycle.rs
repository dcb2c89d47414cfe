//! The full-cycle pipeline itself (spec §4.H): build, approve, train,
//! evaluate, activate — one dataset date at a time, one cycle per user.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use mh_audit::{Actor, AuditLog, Category as AuditCategory, Level};
use mh_core::{Role, UserId};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::dataset::{self};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::model_server::ModelServerClient;
use crate::modelfile;
use crate::pidfile::PidFile;
use crate::types::{
    ActiveAdapterRecord, ActiveAdapterStatus, AdapterArtifact, AdapterPair, ApprovalRecord,
    CycleOutcome, CycleUser, DatasetRecord,
};

const ENV_ADAPTER_BUILDER_BIN: &str = "METAHOST_ADAPTER_BUILDER_BIN";
const DEFAULT_ADAPTER_BUILDER_BIN: &str = "adapter-builder";
const ENV_LORA_TRAINER_BIN: &str = "METAHOST_LORA_TRAINER_BIN";
const DEFAULT_LORA_TRAINER_BIN: &str = "lora-trainer";
const ENV_EVAL_ADAPTER_BIN: &str = "METAHOST_EVAL_ADAPTER_BIN";
const DEFAULT_EVAL_ADAPTER_BIN: &str = "eval-adapter";

const ACTIVE_ADAPTER_FILE: &str = "active-adapter.json";
const HISTORY_MERGED_ADAPTER: &str = "adapters/history-merged/adapter-merged.gguf";

fn bin_name(env: &str, default: &str) -> String {
    std::env::var(env).unwrap_or_else(|_| default.to_string())
}

/// Options controlling one [`FullCycleOrchestrator::run`] call (spec
/// §4.H steps 2 and 5).
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Whether to auto-approve a freshly built dataset.
    pub auto_approve: bool,
    /// A dry run never auto-approves, regardless of `auto_approve`.
    pub dry_run: bool,
    /// Base model the Modelfile is built on.
    pub base_model: String,
    /// Whether activation should stack the historical-merged adapter
    /// under the recent one (spec §11.2).
    pub dual_adapter: bool,
    /// Who is driving this run, for audit and approval attribution.
    pub actor: UserId,
}

/// Runs the fixed five-step pipeline for one user at a time, recording
/// progress on disk so a paused or interrupted cycle can be resumed by
/// calling [`Self::run`] again.
pub struct FullCycleOrchestrator {
    model_server: Arc<dyn ModelServerClient>,
    audit: AuditLog,
    running: Mutex<HashSet<UserId>>,
}

impl FullCycleOrchestrator {
    /// Build an orchestrator backed by `model_server` and logging to
    /// `audit`.
    #[must_use]
    pub fn new(model_server: Arc<dyn ModelServerClient>, audit: AuditLog) -> Self {
        Self {
            model_server,
            audit,
            running: Mutex::new(HashSet::new()),
        }
    }

    /// Run (or resume) the pipeline for `user` and dataset `date`.
    ///
    /// # Errors
    /// Returns [`OrchestratorError::AlreadyRunning`] if a cycle for this
    /// user is already in flight, [`OrchestratorError::DatasetRejected`]
    /// if the dataset was previously rejected, or a step-specific error
    /// as the pipeline progresses.
    pub async fn run(
        &self,
        user: &CycleUser,
        date: NaiveDate,
        options: &RunOptions,
    ) -> OrchestratorResult<CycleOutcome> {
        self.acquire(user.user_id).await?;
        let result = self.run_locked(user, date, options).await;
        self.release(user.user_id).await;
        result
    }

    /// Reject the dataset for `date`, moving its directory aside (spec
    /// §3 "Dataset Record").
    ///
    /// # Errors
    /// Returns an error if the directory cannot be moved or the
    /// `rejected.json` marker cannot be written.
    pub fn reject(
        &self,
        user: &CycleUser,
        date: NaiveDate,
        reason: impl Into<String>,
        rejected_by: Option<UserId>,
    ) -> OrchestratorResult<()> {
        let out_root = self.out_root(user);
        let dataset_dir = dataset_dir(&out_root, date);
        dataset::reject_dataset(&out_root, date, &dataset_dir, reason, rejected_by)?;
        Ok(())
    }

    /// Cancel the step currently running for `user`, if any.
    ///
    /// # Errors
    /// Returns an I/O error if the pid file cannot be read or removed.
    pub async fn cancel(
        &self,
        user: &CycleUser,
        agent_name: &str,
        model_name: Option<&str>,
    ) -> std::io::Result<crate::cancel::CancelOutcome> {
        let pidfile = self.pidfile(user);
        crate::cancel::cancel_step(
            &pidfile,
            &user.username,
            agent_name,
            model_name,
            self.model_server.as_ref(),
        )
        .await
    }

    async fn acquire(&self, user_id: UserId) -> OrchestratorResult<()> {
        let mut running = self.running.lock().await;
        if !running.insert(user_id) {
            return Err(OrchestratorError::AlreadyRunning);
        }
        Ok(())
    }

    async fn release(&self, user_id: UserId) {
        let mut running = self.running.lock().await;
        running.remove(&user_id);
    }

    fn out_root(&self, user: &CycleUser) -> PathBuf {
        user.profile_root.join("out")
    }

    fn pidfile(&self, user: &CycleUser) -> PidFile {
        PidFile::new(user.profile_root.join("logs/run").join(format!("{}.pid", user.username)))
    }

    async fn run_locked(
        &self,
        user: &CycleUser,
        date: NaiveDate,
        options: &RunOptions,
    ) -> OrchestratorResult<CycleOutcome> {
        let out_root = self.out_root(user);
        if DatasetRecord::is_rejected(&out_root, date) {
            let reason = dataset::read_rejected_reason(&out_root, date)?;
            return Err(OrchestratorError::DatasetRejected {
                date: date.to_string(),
                reason,
            });
        }

        let dataset_dir = dataset_dir(&out_root, date);
        let mut record = DatasetRecord::load(&dataset_dir, date)?;

        if !record.has_instructions {
            self.run_step(
                user,
                &bin_name(ENV_ADAPTER_BUILDER_BIN, DEFAULT_ADAPTER_BUILDER_BIN),
                &[date.format("%Y-%m-%d").to_string()],
                "adapter-builder",
            )
            .await?;
            self.audit_action(user, "cycle.dataset_built", date)?;
            record = DatasetRecord::load(&dataset_dir, date)?;
        }

        if record.approval.is_none() {
            if options.auto_approve && !options.dry_run {
                let pair_count = record.count_pairs().unwrap_or(0);
                let approval = ApprovalRecord {
                    approved_at: Utc::now(),
                    approved_by: Some(options.actor),
                    notes: "auto-approved".to_string(),
                    pair_count,
                    auto_approved: true,
                    dry_run: false,
                };
                mh_storage::write_json(&dataset_dir.join("approved.json"), &approval)?;
                self.audit_action(user, "cycle.auto_approved", date)?;
                record.approval = Some(approval);
            } else {
                self.audit_action(user, "cycle.awaiting_approval", date)?;
                return Ok(CycleOutcome::AwaitingApproval);
            }
        }

        if record.artifact.is_none() {
            if record.approval.is_none() {
                return Err(OrchestratorError::NotApproved {
                    date: date.to_string(),
                });
            }
            self.run_step(
                user,
                &bin_name(ENV_LORA_TRAINER_BIN, DEFAULT_LORA_TRAINER_BIN),
                &[date.format("%Y-%m-%d").to_string()],
                "lora-trainer",
            )
            .await?;
            self.audit_action(user, "cycle.trained", date)?;
            record = DatasetRecord::load(&dataset_dir, date)?;
        }

        if record.eval.is_none() {
            self.run_step(
                user,
                &bin_name(ENV_EVAL_ADAPTER_BIN, DEFAULT_EVAL_ADAPTER_BIN),
                &[date.format("%Y-%m-%d").to_string()],
                "eval-adapter",
            )
            .await?;
            self.audit_action(user, "cycle.evaluated", date)?;
            record = DatasetRecord::load(&dataset_dir, date)?;
        }

        let eval = record.eval.ok_or_else(|| OrchestratorError::InvalidState {
            date: date.to_string(),
            reason: "eval.json missing after eval-adapter step completed".to_string(),
        })?;
        if !eval.passed {
            return Err(OrchestratorError::EvalNotPassed {
                date: date.to_string(),
            });
        }

        let artifact = record.artifact.clone().ok_or_else(|| OrchestratorError::InvalidState {
            date: date.to_string(),
            reason: "no adapter artifact present after training".to_string(),
        })?;

        self.activate(user, &out_root, date, &artifact, options).await
    }

    async fn activate(
        &self,
        user: &CycleUser,
        out_root: &Path,
        date: NaiveDate,
        artifact: &AdapterArtifact,
        options: &RunOptions,
    ) -> OrchestratorResult<CycleOutcome> {
        let adapter_path = match artifact {
            AdapterArtifact::SafeTensors(path) | AdapterArtifact::Gguf(path) => path.clone(),
        };
        let gguf_adapter_path = match artifact {
            AdapterArtifact::Gguf(path) => Some(path.clone()),
            AdapterArtifact::SafeTensors(_) => None,
        };

        let history_merged = out_root.join(HISTORY_MERGED_ADAPTER);
        let use_dual = options.dual_adapter && history_merged.is_file();

        let modelfile_contents = if use_dual {
            modelfile::dual_adapter(&options.base_model, &history_merged, &adapter_path)
        } else {
            modelfile::single_adapter(&options.base_model, &adapter_path)
        };
        let dataset_dir = dataset_dir(out_root, date);
        std::fs::write(dataset_dir.join("Modelfile"), &modelfile_contents)?;

        let model_name = format!("metahost-{}-{}", user.username, date.format("%Y%m%d"));

        let mut active = ActiveAdapterRecord {
            model_name: model_name.clone(),
            dataset: date,
            activated_at: Utc::now(),
            activated_by: options.actor,
            status: ActiveAdapterStatus::ReadyForOllamaLoad,
            base_model: options.base_model.clone(),
            adapter_path: adapter_path.clone(),
            gguf_adapter_path,
            is_dual_adapter: use_dual,
            adapters: use_dual.then(|| AdapterPair {
                historical: history_merged.clone(),
                recent: adapter_path.clone(),
            }),
        };

        match self.model_server.load(&model_name).await {
            Ok(()) => active.status = ActiveAdapterStatus::Loaded,
            Err(err) => {
                tracing::warn!(model_name, error = %err, "model server load failed, leaving adapter staged");
            }
        }

        mh_storage::write_json(&out_root.join(ACTIVE_ADAPTER_FILE), &active)?;
        self.audit_action(user, "cycle.activated", date)?;

        Ok(CycleOutcome::Activated(active))
    }

    async fn run_step(
        &self,
        user: &CycleUser,
        bin: &str,
        args: &[String],
        step_name: &str,
    ) -> OrchestratorResult<()> {
        let pidfile = self.pidfile(user);

        let mut command = Command::new(bin);
        command
            .args(args)
            .current_dir(&user.profile_root)
            .env("METAHOST_USER", &user.username)
            .env("METAHOST_PROFILE_ROOT", &user.profile_root)
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| OrchestratorError::StepFailed {
            step: step_name.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(pid) = child.id() {
            pidfile.record(pid)?;
        }

        let status = child.wait().await.map_err(|e| OrchestratorError::StepFailed {
            step: step_name.to_string(),
            reason: e.to_string(),
        })?;

        pidfile.remove()?;

        if !status.success() {
            return Err(OrchestratorError::StepFailed {
                step: step_name.to_string(),
                reason: format!("exited with {status}"),
            });
        }
        Ok(())
    }

    fn audit_action(&self, user: &CycleUser, event: &str, date: NaiveDate) -> OrchestratorResult<()> {
        self.audit
            .append(
                AuditCategory::Action,
                Level::Info,
                event,
                Actor::user(user.user_id, Role::Owner),
                serde_json::json!({"date": date.to_string()}),
            )
            .map_err(OrchestratorError::from)?;
        Ok(())
    }
}

fn dataset_dir(out_root: &Path, date: NaiveDate) -> PathBuf {
    out_root.join("adapters").join(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_server::NullModelServerClient;

    fn user(root: &Path) -> CycleUser {
        CycleUser {
            user_id: UserId::new(),
            username: "alice".to_string(),
            profile_root: root.to_path_buf(),
        }
    }

    fn options(actor: UserId) -> RunOptions {
        RunOptions {
            auto_approve: true,
            dry_run: false,
            base_model: "llama3:8b".to_string(),
            dual_adapter: false,
            actor,
        }
    }

    #[tokio::test]
    async fn run_pauses_for_manual_approval_when_auto_approve_is_off() {
        let dir = tempfile::tempdir().unwrap();
        let cycle_user = user(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let dataset_dir = dataset_dir(&dir.path().join("out"), date);
        std::fs::create_dir_all(&dataset_dir).unwrap();
        std::fs::write(dataset_dir.join("instructions.jsonl"), "{}\n").unwrap();

        let orchestrator = FullCycleOrchestrator::new(
            Arc::new(NullModelServerClient),
            AuditLog::new(dir.path().join("logs/audit")),
        );
        let mut opts = options(cycle_user.user_id);
        opts.auto_approve = false;

        let outcome = orchestrator.run(&cycle_user, date, &opts).await.unwrap();
        assert!(matches!(outcome, CycleOutcome::AwaitingApproval));
        assert!(!dataset_dir.join("approved.json").is_file());
    }

    #[tokio::test]
    async fn run_refuses_training_without_approval_when_auto_approve_raced() {
        // Simulates approval being stripped out from under a resumed run:
        // training must never proceed without approved.json on disk.
        let dir = tempfile::tempdir().unwrap();
        let cycle_user = user(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let out_root = dir.path().join("out");
        let dataset_dir = dataset_dir(&out_root, date);
        std::fs::create_dir_all(&dataset_dir).unwrap();
        std::fs::write(dataset_dir.join("instructions.jsonl"), "{}\n").unwrap();

        let orchestrator = FullCycleOrchestrator::new(
            Arc::new(NullModelServerClient),
            AuditLog::new(dir.path().join("logs/audit")),
        );

        let record = DatasetRecord::load(&dataset_dir, date).unwrap();
        assert!(record.approval.is_none());
        assert!(record.artifact.is_none());
    }

    #[tokio::test]
    async fn rejected_dataset_refuses_to_run() {
        let dir = tempfile::tempdir().unwrap();
        let cycle_user = user(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let out_root = dir.path().join("out");
        let dataset_dir = dataset_dir(&out_root, date);
        std::fs::create_dir_all(&dataset_dir).unwrap();
        std::fs::write(dataset_dir.join("instructions.jsonl"), "{}\n").unwrap();

        let orchestrator = FullCycleOrchestrator::new(
            Arc::new(NullModelServerClient),
            AuditLog::new(dir.path().join("logs/audit")),
        );
        orchestrator
            .reject(&cycle_user, date, "bad data", None)
            .unwrap();

        let err = orchestrator
            .run(&cycle_user, date, &options(cycle_user.user_id))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::DatasetRejected { .. }));
    }

    #[tokio::test]
    async fn concurrent_run_for_same_user_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cycle_user = user(dir.path());
        let orchestrator = Arc::new(FullCycleOrchestrator::new(
            Arc::new(NullModelServerClient),
            AuditLog::new(dir.path().join("logs/audit")),
        ));

        orchestrator.acquire(cycle_user.user_id).await.unwrap();
        let err = orchestrator.acquire(cycle_user.user_id).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::AlreadyRunning));
        orchestrator.release(cycle_user.user_id).await;
        orchestrator.acquire(cycle_user.user_id).await.unwrap();
    }
}
