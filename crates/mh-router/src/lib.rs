//! Storage Router: the single function that turns a logical
//! `{category, subcategory, relativePath}` request into an absolute
//! path, or refuses (spec §4.B).
//!
//! No other crate is allowed to concatenate a path onto a profile root
//! directly — every filesystem access for user data goes through
//! [`resolve`], so traversal and cross-profile bugs are eliminated at a
//! single choke point rather than re-checked at every call site.
//!
//! # Example
//!
//! ```
//! use mh_core::AppRoot;
//! use mh_router::{resolve, Category, ResolveRequest};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let app_root = AppRoot::at(dir.path());
//! app_root.ensure().unwrap();
//! std::fs::create_dir_all(app_root.default_profile_dir("alice")).unwrap();
//!
//! let resolved = resolve(&app_root, &ResolveRequest {
//!     category: Category::Memory,
//!     subcategory: None,
//!     relative_path: Some("notes.json"),
//!     username: "alice",
//!     profile_path_override: None,
//!     internal: false,
//! }).unwrap();
//! assert!(resolved.path.starts_with(app_root.default_profile_dir("alice")));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod category;
mod error;
mod router;

pub use category::Category;
pub use error::{RouterError, RouterResult};
pub use router::{resolve, resolve_profile_root, ResolveRequest, Resolved};
