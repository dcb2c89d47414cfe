//! Mapping every command's errors to the exit codes spec §6 defines:
//! `0` success, `1` validation, `2` permission, `3` not found, `10+`
//! everything else.

use mh_core::{ErrorKind, MhError};

/// The error type every `mh` subcommand returns.
#[derive(Debug)]
pub struct CliError(MhError);

impl CliError {
    /// The process exit code this error maps to (spec §6).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.0.kind() {
            ErrorKind::Validation => 1,
            ErrorKind::Unauthenticated | ErrorKind::Forbidden => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Conflict => 10,
            ErrorKind::Precondition => 11,
            ErrorKind::Transient => 12,
            ErrorKind::Internal => 13,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.message())
    }
}

impl From<MhError> for CliError {
    fn from(err: MhError) -> Self {
        Self(err)
    }
}

impl From<mh_identity::IdentityError> for CliError {
    fn from(err: mh_identity::IdentityError) -> Self {
        let kind = ErrorKind::from(&err);
        Self(MhError::new(kind, err.to_string()))
    }
}

impl From<mh_config::ConfigError> for CliError {
    fn from(err: mh_config::ConfigError) -> Self {
        let kind = ErrorKind::from(&err);
        Self(MhError::new(kind, err.to_string()))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self(MhError::internal(err.to_string()))
    }
}
