//! The fixed set of authentication gates an HTTP route declares (spec
//! §4.D step 3): `public-read`, `authenticated`, `owner-only`,
//! `requires-write-mode`, `requires-operator-mode`.

use mh_policy::Operation;

/// One of the five auth-gate kinds spec §4.D names. Every route in
/// `mh-server`'s table picks exactly one; there is no implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthGate {
    /// No session required; anonymous callers are allowed through.
    PublicRead,
    /// Any authenticated role (owner, standard, or guest) may proceed.
    Authenticated,
    /// Only `Role::Owner` may proceed, independent of cognitive mode
    /// (subject to `high-security`, which still locks out non-read ops).
    OwnerOnly,
    /// Requires the effective cognitive mode to permit writes.
    RequiresWriteMode,
    /// Requires the effective cognitive mode to be `agent`.
    RequiresOperatorMode,
}

impl AuthGate {
    /// The `mh-policy` operation this gate is checked against.
    #[must_use]
    pub fn operation(self) -> Operation {
        match self {
            AuthGate::PublicRead => Operation::ReadPublic,
            AuthGate::Authenticated => Operation::ReadProfile,
            AuthGate::OwnerOnly => Operation::ManageUsers,
            AuthGate::RequiresWriteMode => Operation::WriteProfile,
            AuthGate::RequiresOperatorMode => Operation::RunOperator,
        }
    }
}
