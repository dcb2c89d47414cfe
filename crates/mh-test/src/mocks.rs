//! Recording fakes for cross-crate contracts.

use std::sync::Mutex;

use mh_orchestrator::ModelServerClient;

/// A call captured by [`RecordingModelServerClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelServerCall {
    /// `load(model_name)` was invoked.
    Load(String),
    /// `unload(model_name)` was invoked.
    Unload(String),
}

/// A [`ModelServerClient`] that always succeeds and records every call it
/// received, for asserting an orchestrator run actually loaded/unloaded
/// the models it was supposed to without making a network request.
#[derive(Debug, Default)]
pub struct RecordingModelServerClient {
    calls: Mutex<Vec<ModelServerCall>>,
}

impl RecordingModelServerClient {
    /// Build an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ModelServerCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

#[async_trait::async_trait]
impl ModelServerClient for RecordingModelServerClient {
    async fn load(&self, model_name: &str) -> Result<(), String> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push(ModelServerCall::Load(model_name.to_string()));
        Ok(())
    }

    async fn unload(&self, model_name: &str) -> Result<(), String> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push(ModelServerCall::Unload(model_name.to_string()));
        Ok(())
    }
}
