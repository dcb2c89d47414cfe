//! Commonly used types for convenient import.
//!
//! Use `use mh_router::prelude::*;` to import all essential types.

pub use crate::{resolve, resolve_profile_root, Category, ResolveRequest, Resolved};
pub use crate::{RouterError, RouterResult};
