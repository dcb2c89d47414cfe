//! Commonly used types for convenient import.
//!
//! Use `use mh_identity::prelude::*;` to import all essential types.

pub use crate::{IdentityError, IdentityResult};
pub use crate::IdentityStore;
pub use crate::{
    ProfileVisibility, RecoveryCode, Session, SessionMetadata, StoredHash, User, UserMetadata,
    UserRecord,
};
