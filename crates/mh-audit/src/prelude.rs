//! Commonly used types for convenient import.
//!
//! Use `use mh_audit::prelude::*;` to import all essential types.

pub use crate::{Actor, AuditEntry, AuditError, AuditLog, AuditResult, Category, Level};
