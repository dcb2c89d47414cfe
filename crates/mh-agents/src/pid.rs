//! Liveness checks shared by the registry and the scheduler.

use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Sending signal `0` checks liveness without actually signaling the
/// process: `ESRCH` means gone, `EPERM` means alive but owned by
/// another user, anything else we treat conservatively as alive.
#[must_use]
pub(crate) fn is_pid_alive(pid: u32) -> bool {
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(_) => true,
    }
}
