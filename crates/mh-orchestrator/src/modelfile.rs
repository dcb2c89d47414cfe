//! Generating the Ollama `Modelfile` that stages an adapter for load
//! (spec §4.H step 5 "Activate"). A Modelfile references a base model
//! and one or two `ADAPTER` layers; dual-adapter Modelfiles are the only
//! place this crate stacks more than one artifact.

use std::path::Path;

/// Build a single-adapter Modelfile referencing `adapter_path` on top of
/// `base_model`.
#[must_use]
pub fn single_adapter(base_model: &str, adapter_path: &Path) -> String {
    format!(
        "FROM {base_model}\nADAPTER {}\n",
        adapter_path.display()
    )
}

/// Build a dual-adapter Modelfile stacking `historical` under `recent`
/// (spec §11.2: the historical-merged adapter is loaded first so the
/// most recent dataset's adapter takes precedence).
#[must_use]
pub fn dual_adapter(base_model: &str, historical: &Path, recent: &Path) -> String {
    format!(
        "FROM {base_model}\nADAPTER {}\nADAPTER {}\n",
        historical.display(),
        recent.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn single_adapter_references_base_and_artifact() {
        let content = single_adapter("llama3:8b", &PathBuf::from("/out/2026-07-26/adapter.gguf"));
        assert!(content.starts_with("FROM llama3:8b\n"));
        assert!(content.contains("ADAPTER /out/2026-07-26/adapter.gguf"));
    }

    #[test]
    fn dual_adapter_stacks_historical_before_recent() {
        let content = dual_adapter(
            "llama3:8b",
            &PathBuf::from("/out/adapters/history-merged/adapter-merged.gguf"),
            &PathBuf::from("/out/2026-07-26/adapter.gguf"),
        );
        let historical_idx = content.find("history-merged").unwrap();
        let recent_idx = content.find("2026-07-26").unwrap();
        assert!(historical_idx < recent_idx);
    }
}
