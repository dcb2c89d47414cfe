//! Commonly used types for convenient import.
//!
//! Use `use mh_pipeline::prelude::*;` to import all essential types.

pub use crate::{AuthGate, Pipeline, PipelineContext, RequestMeta};
