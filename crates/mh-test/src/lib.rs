//! Shared test utilities for the Metahost workspace.
//!
//! Pulled out of the per-crate `#[cfg(test)] mod tests` boilerplate every
//! crate in this workspace repeats (`tempfile::tempdir()` + `AppRoot::at`
//! + `.ensure()`), plus a recording `ModelServerClient` for exercising
//! `mh-orchestrator` consumers without a network call.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! mh-test.workspace = true
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
