//! Commonly used types for convenient import.
//!
//! Use `use mh_policy::prelude::*;` to import all essential types.

pub use crate::{check, Decision, DenyReason, Operation};
