//! Cancelling an in-flight pipeline step (spec §4.H "Cancellation"):
//! "Sends graceful termination to the recorded process group. Falls back
//! to scanning the process table by agent name and owning username. Asks
//! the model server to unload any in-flight models. Always removes the
//! pid file; returns the list of actually-killed pids."

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::model_server::ModelServerClient;
use crate::pidfile::PidFile;

/// One cancellation attempt's result.
#[derive(Debug, Default)]
pub struct CancelOutcome {
    /// Pids that were actually sent a signal, by either step.
    pub killed_pids: Vec<i32>,
    /// Whether the recorded process group responded to the graceful
    /// signal (as opposed to falling back to the process-table scan).
    pub used_recorded_pgid: bool,
}

/// Send `SIGTERM` to the process group recorded for `username`'s
/// currently running step, falling back to a `/proc` scan by process
/// name and owner, then ask the model server to unload `model_name` if
/// one is staged. Always removes the pid file.
pub async fn cancel_step(
    pidfile: &PidFile,
    username: &str,
    agent_name: &str,
    model_name: Option<&str>,
    model_server: &dyn ModelServerClient,
) -> std::io::Result<CancelOutcome> {
    let mut outcome = CancelOutcome::default();

    match pidfile.read()? {
        Some(pgid) => {
            if signal_process_group(pgid) {
                outcome.killed_pids.push(pgid as i32);
                outcome.used_recorded_pgid = true;
            }
        }
        None => {}
    }

    if outcome.killed_pids.is_empty() {
        outcome.killed_pids = scan_process_table(agent_name, username)?;
        for pid in &outcome.killed_pids {
            let _ = signal::kill(Pid::from_raw(*pid), Signal::SIGTERM);
        }
    }

    if let Some(model_name) = model_name {
        if let Err(err) = model_server.unload(model_name).await {
            tracing::warn!(model_name, error = %err, "failed to unload model during cancellation");
        }
    }

    pidfile.remove()?;
    Ok(outcome)
}

/// Send `SIGTERM` to every process in group `pgid` via `killpg`. Returns
/// whether the group still existed (`ESRCH` means the step already
/// exited on its own).
fn signal_process_group(pgid: u32) -> bool {
    match signal::killpg(Pid::from_raw(pgid as i32), Signal::SIGTERM) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(err) => {
            tracing::warn!(pgid, %err, "killpg failed");
            false
        }
    }
}

/// Scan `/proc` for processes named `agent_name` and owned by
/// `username`, used when the recorded pid file is stale or missing
/// (spec §4.H: "falls back to scanning the process table").
fn scan_process_table(agent_name: &str, username: &str) -> std::io::Result<Vec<i32>> {
    let Some(user) = nix::unistd::User::from_name(username).ok().flatten() else {
        return Ok(Vec::new());
    };
    let target_uid = user.uid;

    let mut matches = Vec::new();
    for entry in std::fs::read_dir("/proc")? {
        let entry = entry?;
        let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<i32>().ok()) else {
            continue;
        };

        let comm_path = entry.path().join("comm");
        let Ok(comm) = std::fs::read_to_string(&comm_path) else {
            continue;
        };
        if comm.trim() != agent_name {
            continue;
        }

        let Ok(metadata) = std::fs::metadata(entry.path()) else {
            continue;
        };
        if std::os::unix::fs::MetadataExt::uid(&metadata) != target_uid.as_raw() {
            continue;
        }

        matches.push(pid);
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_server::NullModelServerClient;

    #[tokio::test]
    async fn cancel_with_no_recorded_pid_and_unknown_user_removes_pidfile() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = PidFile::new(dir.path().join("run/ghost.pid"));
        let outcome = cancel_step(
            &pidfile,
            "user-that-almost-certainly-does-not-exist-xyz",
            "adapter-builder",
            None,
            &NullModelServerClient,
        )
        .await
        .unwrap();
        assert!(outcome.killed_pids.is_empty());
        assert!(pidfile.read().unwrap().is_none());
    }

    #[tokio::test]
    async fn cancel_with_stale_recorded_pgid_falls_back_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = PidFile::new(dir.path().join("run/stale.pid"));
        // A pgid astronomically unlikely to exist.
        pidfile.record(999_999).unwrap();
        let outcome = cancel_step(
            &pidfile,
            "user-that-almost-certainly-does-not-exist-xyz",
            "adapter-builder",
            Some("metahost-persona"),
            &NullModelServerClient,
        )
        .await
        .unwrap();
        assert!(!outcome.used_recorded_pgid);
        assert!(pidfile.read().unwrap().is_none());
    }
}
