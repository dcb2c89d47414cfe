//! The pure `(role, cognitiveMode, operation) -> decision` function (spec
//! §4.C). No I/O, no clock, no hidden state — every input is a value the
//! caller already has in its `UserContext`.

use mh_core::{CognitiveMode, Role};

use crate::operation::Operation;

/// A stable, auditable reason a request was denied. Never carries the
/// attempted path or payload (spec §4.C: "Denials carry a stable reason
/// code and never leak the attempted path").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// No session, or an expired one, for an operation that requires one.
    Unauthenticated,
    /// The role is never permitted to perform this operation, regardless
    /// of cognitive mode.
    RoleNotPermitted,
    /// The effective cognitive mode is `emulation`, which forbids writes.
    ModeForbidsWrite,
    /// `run-operator` requires the effective mode to be `agent`.
    ModeRequiresAgent,
    /// `high-security` forces emulation and denies every non-read
    /// operation outright.
    HighSecurityLockdown,
}

impl DenyReason {
    /// A stable machine-readable code, safe to put in an audit record or
    /// an HTTP error body.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::RoleNotPermitted => "role_not_permitted",
            DenyReason::ModeForbidsWrite => "mode_forbids_write",
            DenyReason::ModeRequiresAgent => "mode_requires_agent",
            DenyReason::HighSecurityLockdown => "high_security_lockdown",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// The result of [`check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The operation may proceed.
    Allow,
    /// The operation is refused, with a stable reason.
    Deny(DenyReason),
}

impl Decision {
    /// True for [`Decision::Allow`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// A guest or anonymous session is pinned to `emulation` no matter what
/// the process-wide mode is (spec §4.C).
fn effective_mode(role: Role, mode: CognitiveMode) -> CognitiveMode {
    match role {
        Role::Guest | Role::Anonymous => CognitiveMode::Emulation,
        Role::Owner | Role::Standard => mode,
    }
}

/// Decide whether `role` acting under `mode` may perform `operation`
/// against its own profile (spec §4.C table). The router already
/// confines path resolution to the caller's own profile, so this
/// function never takes a "whose profile" parameter — by the time a
/// request reaches here, "own" is the only profile in play.
#[must_use]
pub fn check(role: Role, mode: CognitiveMode, operation: Operation) -> Decision {
    let effective = effective_mode(role, mode);

    if effective == CognitiveMode::HighSecurity
        && !matches!(operation, Operation::ReadPublic | Operation::ReadProfile)
    {
        return Decision::Deny(DenyReason::HighSecurityLockdown);
    }

    match operation {
        Operation::ReadPublic => Decision::Allow,
        Operation::ReadProfile => {
            if role.is_authenticated() {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::Unauthenticated)
            }
        }
        Operation::WriteProfile => {
            if matches!(role, Role::Guest | Role::Anonymous) {
                Decision::Deny(DenyReason::RoleNotPermitted)
            } else if !effective.allows_write() {
                Decision::Deny(DenyReason::ModeForbidsWrite)
            } else {
                Decision::Allow
            }
        }
        Operation::MutateConfig => {
            if role == Role::Owner {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::RoleNotPermitted)
            }
        }
        Operation::StartAgent => {
            if role == Role::Owner {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::RoleNotPermitted)
            }
        }
        Operation::RunOperator => {
            if role != Role::Owner {
                Decision::Deny(DenyReason::RoleNotPermitted)
            } else if effective != CognitiveMode::Agent {
                Decision::Deny(DenyReason::ModeRequiresAgent)
            } else {
                Decision::Allow
            }
        }
        Operation::ManageUsers => {
            if role == Role::Owner {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::RoleNotPermitted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_public_always_allowed() {
        for role in [Role::Owner, Role::Standard, Role::Guest, Role::Anonymous] {
            for mode in [
                CognitiveMode::DualConsciousness,
                CognitiveMode::Agent,
                CognitiveMode::Emulation,
                CognitiveMode::HighSecurity,
            ] {
                assert_eq!(check(role, mode, Operation::ReadPublic), Decision::Allow);
            }
        }
    }

    #[test]
    fn anonymous_cannot_read_profile() {
        assert_eq!(
            check(Role::Anonymous, CognitiveMode::DualConsciousness, Operation::ReadProfile),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn guest_can_read_but_not_write_profile() {
        assert_eq!(
            check(Role::Guest, CognitiveMode::DualConsciousness, Operation::ReadProfile),
            Decision::Allow
        );
        assert_eq!(
            check(Role::Guest, CognitiveMode::DualConsciousness, Operation::WriteProfile),
            Decision::Deny(DenyReason::RoleNotPermitted)
        );
    }

    #[test]
    fn write_profile_denied_in_emulation_mode() {
        assert_eq!(
            check(Role::Owner, CognitiveMode::Emulation, Operation::WriteProfile),
            Decision::Deny(DenyReason::ModeForbidsWrite)
        );
        assert_eq!(
            check(Role::Standard, CognitiveMode::DualConsciousness, Operation::WriteProfile),
            Decision::Allow
        );
    }

    #[test]
    fn high_security_locks_down_every_non_read_operation() {
        for op in [
            Operation::WriteProfile,
            Operation::MutateConfig,
            Operation::StartAgent,
            Operation::RunOperator,
            Operation::ManageUsers,
        ] {
            assert_eq!(
                check(Role::Owner, CognitiveMode::HighSecurity, op),
                Decision::Deny(DenyReason::HighSecurityLockdown)
            );
        }
        assert_eq!(
            check(Role::Owner, CognitiveMode::HighSecurity, Operation::ReadProfile),
            Decision::Allow
        );
    }

    #[test]
    fn guest_is_pinned_to_emulation_regardless_of_process_mode() {
        // Even if the process-wide mode is `agent`, a guest's effective
        // mode is still emulation, so writes stay denied.
        assert_eq!(
            check(Role::Guest, CognitiveMode::Agent, Operation::WriteProfile),
            Decision::Deny(DenyReason::RoleNotPermitted)
        );
    }

    #[test]
    fn only_owner_may_manage_users_or_start_agents() {
        for role in [Role::Standard, Role::Guest, Role::Anonymous] {
            assert_eq!(
                check(role, CognitiveMode::DualConsciousness, Operation::ManageUsers),
                Decision::Deny(DenyReason::RoleNotPermitted)
            );
            assert_eq!(
                check(role, CognitiveMode::DualConsciousness, Operation::StartAgent),
                Decision::Deny(DenyReason::RoleNotPermitted)
            );
        }
        assert_eq!(
            check(Role::Owner, CognitiveMode::DualConsciousness, Operation::ManageUsers),
            Decision::Allow
        );
    }

    #[test]
    fn run_operator_requires_agent_mode() {
        assert_eq!(
            check(Role::Owner, CognitiveMode::DualConsciousness, Operation::RunOperator),
            Decision::Deny(DenyReason::ModeRequiresAgent)
        );
        assert_eq!(
            check(Role::Owner, CognitiveMode::Agent, Operation::RunOperator),
            Decision::Allow
        );
        assert_eq!(
            check(Role::Standard, CognitiveMode::Agent, Operation::RunOperator),
            Decision::Deny(DenyReason::RoleNotPermitted)
        );
    }

    #[test]
    fn mutate_config_is_owner_only_and_blocked_by_high_security() {
        assert_eq!(
            check(Role::Owner, CognitiveMode::DualConsciousness, Operation::MutateConfig),
            Decision::Allow
        );
        assert_eq!(
            check(Role::Standard, CognitiveMode::DualConsciousness, Operation::MutateConfig),
            Decision::Deny(DenyReason::RoleNotPermitted)
        );
        assert_eq!(
            check(Role::Owner, CognitiveMode::HighSecurity, Operation::MutateConfig),
            Decision::Deny(DenyReason::HighSecurityLockdown)
        );
    }
}
