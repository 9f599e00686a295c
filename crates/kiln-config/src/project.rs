//! Project layout: entries and the directories a build reads from and writes to.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Entry name used when none are configured.
pub const DEFAULT_ENTRY_NAME: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Entry modules, relative to the project root, in declaration order.
    /// Empty means a single `main` entry at `src/main.js`.
    #[serde(default)]
    pub entries: Vec<EntryConfig>,

    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Copied verbatim into the output root in production.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    #[serde(default = "default_html_template")]
    pub html_template: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Module graph manifest produced by the resolver.
    #[serde(default = "default_graph")]
    pub graph: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            source_dir: default_source_dir(),
            static_dir: default_static_dir(),
            html_template: default_html_template(),
            output_dir: default_output_dir(),
            graph: default_graph(),
        }
    }
}

impl ProjectConfig {
    /// Configured entries by name, or the single default entry.
    ///
    /// A later entry with the same name replaces an earlier one; schema
    /// validation rejects such duplicates.
    pub fn effective_entries(&self) -> IndexMap<String, PathBuf> {
        if self.entries.is_empty() {
            let mut entries = IndexMap::new();
            entries.insert(DEFAULT_ENTRY_NAME.to_string(), PathBuf::from("src/main.js"));
            return entries;
        }
        self.entries
            .iter()
            .map(|entry| (entry.name(), entry.path().to_path_buf()))
            .collect()
    }
}

/// An entry point: either a bare path, named after its file stem, or an
/// explicit `{ name, path }` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    Path(PathBuf),
    Named { name: String, path: PathBuf },
}

impl EntryConfig {
    pub fn name(&self) -> String {
        match self {
            EntryConfig::Named { name, .. } => name.clone(),
            EntryConfig::Path(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            EntryConfig::Path(path) | EntryConfig::Named { path, .. } => path,
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_html_template() -> PathBuf {
    PathBuf::from("public/index.html")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_graph() -> PathBuf {
    PathBuf::from("kiln-graph.json")
}
