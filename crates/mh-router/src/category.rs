//! The fixed `category`/`subcategory` taxonomy (spec §4.B).

use serde::{Deserialize, Serialize};

/// The top-level subtree a resolved path lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Conversation/persona memory.
    Memory,
    /// Voice samples and synthesis artifacts.
    Voice,
    /// Per-profile configuration (`etc/agents.json`, `models.json`, ...).
    Config,
    /// Generated output (exports, renders, transcripts).
    Output,
    /// Adapter training datasets and checkpoints (spec §4.H, durable
    /// layout `out/`).
    Training,
    /// Scratch/cache data, safe to purge.
    Cache,
    /// Installation-root directories (`logs`, `agents`, `brain`, `etc`).
    /// Restricted to internal callers (spec §4.B step 3).
    System,
}

impl Category {
    /// The directory name this category maps to under a profile root.
    /// Meaningless for [`Category::System`], which resolves under the
    /// installation root instead; see `Router::resolve`.
    #[must_use]
    pub fn profile_subtree(self) -> &'static str {
        match self {
            Category::Memory => "memory",
            Category::Voice => "voice",
            Category::Config => "etc",
            Category::Output => "output",
            Category::Training => "out",
            Category::Cache => "cache",
            Category::System => "",
        }
    }
}
