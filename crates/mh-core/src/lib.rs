//! Shared foundation types for the Metahost multi-tenant agent runtime:
//! the stable error taxonomy, role/cognitive-mode types, the installation-
//! root directory scaffolding, the process-wide cognitive-mode cell, and
//! the explicit per-request `UserContext`.

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod approot;
pub mod context;
pub mod error;
pub mod mode;
pub mod types;

pub use approot::AppRoot;
pub use context::UserContext;
pub use error::{ErrorKind, MhError, MhResult};
pub use mode::{CognitiveModeCell, ModeSnapshot};
pub use types::{CognitiveMode, Role, SessionId, UserId};
