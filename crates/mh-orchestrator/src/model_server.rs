//! The local model server (Ollama/vLLM) is an external collaborator
//! (spec §1: "The LLM backends ... the spec defines how the core starts,
//! stops, and routes to them, not their internals"). This module only
//! needs two verbs: load a Modelfile-defined model, and unload whatever
//! is currently resident. Both are best-effort: a failure here is a
//! `TRANSIENT` condition the caller logs and moves on from, never a
//! reason to fail a full cycle that otherwise completed correctly.

use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const ENV_BASE_URL: &str = "METAHOST_MODEL_SERVER_URL";

/// Asks the local model server to load or unload a named model.
#[async_trait::async_trait]
pub trait ModelServerClient: Send + Sync {
    /// Load `model_name`, transitioning it from staged to resident.
    async fn load(&self, model_name: &str) -> Result<(), String>;

    /// Unload `model_name` if it is currently resident.
    async fn unload(&self, model_name: &str) -> Result<(), String>;
}

/// Talks to an Ollama-compatible HTTP API. The exact request/response
/// wire format is the backend's concern (out of scope, spec §1); this
/// client only needs the two calls this crate uses.
pub struct HttpModelServerClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpModelServerClient {
    /// Build a client against `$METAHOST_MODEL_SERVER_URL`, or
    /// `http://localhost:11434` if unset.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Build a client against an explicit base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl ModelServerClient for HttpModelServerClient {
    async fn load(&self, model_name: &str) -> Result<(), String> {
        let url = format!("{}/api/generate", self.base_url);
        self.client
            .post(url)
            .timeout(DEFAULT_TIMEOUT)
            .json(&serde_json::json!({"model": model_name, "keep_alive": "30m"}))
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn unload(&self, model_name: &str) -> Result<(), String> {
        let url = format!("{}/api/generate", self.base_url);
        self.client
            .post(url)
            .timeout(DEFAULT_TIMEOUT)
            .json(&serde_json::json!({"model": model_name, "keep_alive": 0}))
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// A client that does nothing, successfully. Useful for headless runs
/// (`HEADLESS_RUNTIME=true`, spec §6) and tests.
pub struct NullModelServerClient;

#[async_trait::async_trait]
impl ModelServerClient for NullModelServerClient {
    async fn load(&self, _model_name: &str) -> Result<(), String> {
        Ok(())
    }

    async fn unload(&self, _model_name: &str) -> Result<(), String> {
        Ok(())
    }
}
