//! The process-wide cognitive mode as a single-writer, versioned value.
//!
//! Spec §9 calls the cognitive-mode global "a deliberate design constraint"
//! and asks for it to be treated as "a single-writer value with a
//! versioned snapshot so handlers observe a coherent `(mode, role)` pair."
//! [`CognitiveModeCell`] is that holder: readers get an immutable snapshot
//! (mode + monotonic version), writers go through [`CognitiveModeCell::set`]
//! which is the only mutation path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::types::CognitiveMode;

/// An observed `(mode, version)` pair. Two snapshots taken at different
/// times compare unequal if and only if the mode actually changed between
/// them (or was set to the same value again), because `version` always
/// advances on `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSnapshot {
    /// The mode at the time this snapshot was taken.
    pub mode: CognitiveMode,
    /// Monotonically increasing version, bumped on every `set`.
    pub version: u64,
}

/// Single-writer holder for the process-wide cognitive mode.
#[derive(Debug)]
pub struct CognitiveModeCell {
    mode: RwLock<CognitiveMode>,
    version: AtomicU64,
}

impl CognitiveModeCell {
    /// Start in `dual-consciousness`, unless `high_security` forces
    /// `emulation` at boot (spec §3, §4.C).
    #[must_use]
    pub fn new(high_security: bool) -> Self {
        let initial = if high_security {
            CognitiveMode::HighSecurity
        } else {
            CognitiveMode::DualConsciousness
        };
        Self {
            mode: RwLock::new(initial),
            version: AtomicU64::new(0),
        }
    }

    /// Read the current mode and version as a coherent pair.
    #[must_use]
    pub fn snapshot(&self) -> ModeSnapshot {
        let mode = *self.mode.read().expect("mode lock poisoned");
        let version = self.version.load(Ordering::SeqCst);
        ModeSnapshot { mode, version }
    }

    /// Attempt to change the mode. Refuses if the cell is currently
    /// `high-security` (spec §3: "blocks mode changes"). Returns the new
    /// snapshot on success.
    pub fn set(&self, new_mode: CognitiveMode) -> Result<ModeSnapshot, ModeSnapshot> {
        let mut guard = self.mode.write().expect("mode lock poisoned");
        if *guard == CognitiveMode::HighSecurity {
            let version = self.version.load(Ordering::SeqCst);
            return Err(ModeSnapshot {
                mode: *guard,
                version,
            });
        }
        *guard = new_mode;
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ModeSnapshot {
            mode: new_mode,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_security_blocks_further_changes() {
        let cell = CognitiveModeCell::new(true);
        assert_eq!(cell.snapshot().mode, CognitiveMode::HighSecurity);
        let result = cell.set(CognitiveMode::Agent);
        assert!(result.is_err());
        assert_eq!(cell.snapshot().mode, CognitiveMode::HighSecurity);
    }

    #[test]
    fn set_bumps_version_each_time() {
        let cell = CognitiveModeCell::new(false);
        let v0 = cell.snapshot().version;
        let v1 = cell.set(CognitiveMode::Agent).unwrap().version;
        let v2 = cell.set(CognitiveMode::Emulation).unwrap().version;
        assert!(v1 > v0);
        assert!(v2 > v1);
    }
}
