//! Commonly used types for convenient import.
//!
//! Use `use mh_events::prelude::*;` to import all essential types.

pub use crate::ActivityBus;
