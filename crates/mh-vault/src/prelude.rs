//! Commonly used types for convenient import.
//!
//! Use `use mh_vault::prelude::*;` to import all essential types.

pub use crate::metadata::{EncryptionMetadata, PasswordMode};
pub use crate::progress::{ProgressEvent, ProgressSender, Status, Step};
pub use crate::{decrypt_profile, encrypt_profile, verify_password, KeyCache, VaultError, VaultResult};
