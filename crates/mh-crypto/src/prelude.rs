//! Commonly used types for convenient import.
//!
//! Use `use mh_crypto::prelude::*;` to import all essential types.

pub use crate::{CryptoError, CryptoResult};
pub use crate::{PasswordHash, MIN_PASSWORD_LEN};
pub use crate::{ProfileKey, KDF_ITERATIONS, SALT_LEN};
pub use crate::ContentHash;
pub use crate::generate_recovery_code;
