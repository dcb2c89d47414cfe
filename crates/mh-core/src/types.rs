//! Small shared value types: roles, cognitive modes, and id newtypes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's authorization role (spec §3 `User.role`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Created at bootstrap time, or explicitly promoted. Exactly one
    /// owner may exist at bootstrap.
    Owner,
    /// Default role for registrations after the first.
    Standard,
    /// Read-only, own profile only.
    Guest,
    /// No session, or an expired one.
    Anonymous,
}

impl Role {
    /// True for any role that has passed authentication (i.e. not anonymous).
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        !matches!(self, Role::Anonymous)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Owner => "owner",
            Role::Standard => "standard",
            Role::Guest => "guest",
            Role::Anonymous => "anonymous",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "standard" => Ok(Role::Standard),
            "guest" => Ok(Role::Guest),
            "anonymous" => Ok(Role::Anonymous),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Process-wide cognitive mode (spec §3). There is exactly one live value
/// of this per process; see [`crate::mode::CognitiveModeCell`] for the
/// single-writer versioned holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CognitiveMode {
    /// Normal dual-consciousness operation.
    DualConsciousness,
    /// Autonomous agent operation; required for `run-operator`.
    Agent,
    /// Read-only persona emulation. Forced for guests/anonymous always,
    /// and forced globally under `high-security`.
    Emulation,
    /// Forces emulation and blocks mode changes (spec §3, §4.C).
    HighSecurity,
}

impl CognitiveMode {
    /// Whether this mode permits `write-profile` (spec §4.C table).
    #[must_use]
    pub fn allows_write(self) -> bool {
        !matches!(self, CognitiveMode::Emulation | CognitiveMode::HighSecurity)
    }
}

impl fmt::Display for CognitiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CognitiveMode::DualConsciousness => "dual-consciousness",
            CognitiveMode::Agent => "agent",
            CognitiveMode::Emulation => "emulation",
            CognitiveMode::HighSecurity => "high-security",
        };
        f.write_str(s)
    }
}

macro_rules! uuid_newtype {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_newtype!(UserId, "Opaque identifier for a `User` record.");
uuid_newtype!(SessionId, "Opaque identifier for a `Session` record.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrips_through_display_and_fromstr() {
        for role in [Role::Owner, Role::Standard, Role::Guest, Role::Anonymous] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn emulation_and_high_security_block_writes() {
        assert!(!CognitiveMode::Emulation.allows_write());
        assert!(!CognitiveMode::HighSecurity.allows_write());
        assert!(CognitiveMode::Agent.allows_write());
        assert!(CognitiveMode::DualConsciousness.allows_write());
    }

    #[test]
    fn anonymous_is_not_authenticated() {
        assert!(!Role::Anonymous.is_authenticated());
        assert!(Role::Guest.is_authenticated());
    }
}
