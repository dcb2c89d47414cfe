//! Security Policy: a pure `(role, cognitiveMode, operation) -> decision`
//! function gating every write and privileged action (spec §4.C).
//!
//! There is no state here and no I/O — every call is independently
//! reproducible from its three inputs, which `mh-pipeline` already has
//! on hand in the request's `UserContext`. This crate never talks to the
//! filesystem, the identity store, or the network; it only classifies.
//!
//! # Example
//!
//! ```
//! use mh_core::{CognitiveMode, Role};
//! use mh_policy::{check, Decision, DenyReason, Operation};
//!
//! let decision = check(Role::Standard, CognitiveMode::Emulation, Operation::WriteProfile);
//! assert_eq!(decision, Decision::Deny(DenyReason::ModeForbidsWrite));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod decision;
mod operation;

pub use decision::{check, Decision, DenyReason};
pub use operation::Operation;
