//! User-declared transform rules.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RuleOutput {
    #[default]
    Script,
    Style,
    /// Inlined below the asset threshold, emitted otherwise.
    Asset,
    /// Always emitted as a file.
    AssetResource,
}

/// One `[[rules]]` entry.
///
/// ```toml
/// [[rules]]
/// name = "markdown"
/// extensions = ["md"]
/// stages = ["markdown", "babel"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,

    pub extensions: Vec<String>,

    /// Only match modules under the project's source directory.
    #[serde(default)]
    pub source_only: bool,

    /// Stage identifiers in execution order.
    #[serde(default)]
    pub stages: Vec<String>,

    #[serde(default)]
    pub output: RuleOutput,
}
