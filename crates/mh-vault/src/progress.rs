//! Streaming progress events for encrypt/decrypt runs (spec §4.E:
//! "the caller provides a sink; the subsystem emits `{step, status,
//! message, progress%, error?}` records").
//!
//! Adapted from `sblanchard-SerialAgent`'s `api/chat.rs` streaming
//! pattern: a `tokio::sync::mpsc` channel feeds events out of a
//! blocking worker, and `mh-server` turns the receiver into an SSE
//! stream. Cancellation is cooperative — dropping the receiver makes
//! further sends fail, which the worker treats as "stop after this
//! file" (spec §4.E: "the caller may close the sink; the subsystem
//! finishes the current file and stops").

use serde::{Deserialize, Serialize};

/// Which phase of a run a [`ProgressEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Installing or verifying the metadata and verification blob.
    Prepare,
    /// Transforming one profile file.
    File,
    /// The run has finished.
    Complete,
}

/// Status of the event being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Still running.
    InProgress,
    /// Finished successfully.
    Ok,
    /// Terminal failure.
    Error,
}

/// One streamed progress record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Which phase this event describes.
    pub step: Step,
    /// Status of this event.
    pub status: Status,
    /// Human-readable detail, e.g. the file currently being processed.
    pub message: String,
    /// 0-100.
    pub progress_percent: u8,
    /// Set only when `status` is [`Status::Error`].
    pub error: Option<String>,
}

impl ProgressEvent {
    /// An in-progress event for the prepare phase.
    #[must_use]
    pub fn preparing(message: impl Into<String>) -> Self {
        Self {
            step: Step::Prepare,
            status: Status::InProgress,
            message: message.into(),
            progress_percent: 0,
            error: None,
        }
    }

    /// An in-progress event for one file, with overall percent complete.
    #[must_use]
    pub fn file(message: impl Into<String>, progress_percent: u8) -> Self {
        Self {
            step: Step::File,
            status: Status::InProgress,
            message: message.into(),
            progress_percent,
            error: None,
        }
    }

    /// The terminal success event.
    #[must_use]
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            step: Step::Complete,
            status: Status::Ok,
            message: message.into(),
            progress_percent: 100,
            error: None,
        }
    }

    /// The terminal failure event.
    #[must_use]
    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            step: Step::Complete,
            status: Status::Error,
            message: message.into(),
            progress_percent: 100,
            error: Some(error.into()),
        }
    }
}

/// The sending half handed to `encrypt_profile`/`decrypt_profile`. A
/// plain type alias over the channel sender keeps the public API from
/// naming `tokio::sync::mpsc` at every call site.
pub type ProgressSender = tokio::sync::mpsc::Sender<ProgressEvent>;
