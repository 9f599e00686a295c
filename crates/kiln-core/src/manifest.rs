//! JSON form of the module graph, as produced by an external resolver.
//!
//! ```json
//! {
//!   "modules": [
//!     { "path": "src/main.js", "size": 120, "imports": ["src/App.tsx"] },
//!     { "path": "src/App.tsx", "kind": "typed-script" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::ModuleGraph;
use crate::module::ModuleKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphManifest {
    #[serde(default)]
    pub modules: Vec<ManifestModule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestModule {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ModuleKind>,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<PathBuf>,
}

impl GraphManifest {
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| Error::InvalidManifest(e.to_string()))
    }

    /// Build a graph rooted at `root` with the given named entries.
    pub fn into_graph(self, root: &Path, entries: &IndexMap<String, PathBuf>) -> Result<ModuleGraph> {
        let mut builder = ModuleGraph::builder(root);
        let mut edges = Vec::new();

        for module in self.modules {
            for import in &module.imports {
                edges.push((module.path.clone(), import.clone()));
            }
            builder = builder.module(&module.path, module.kind, module.size);
        }
        for (from, to) in edges {
            builder = builder.import(from, to);
        }
        for (name, path) in entries {
            builder = builder.entry(name.clone(), path);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_builds_graph() {
        let manifest = GraphManifest::from_json(
            r#"{
                "modules": [
                    { "path": "src/main.js", "size": 120, "imports": ["src/App.tsx", "src/logo.png"] },
                    { "path": "src/App.tsx" },
                    { "path": "src/logo.png", "size": 2048 }
                ]
            }"#,
        )
        .unwrap();

        let mut entries = IndexMap::new();
        entries.insert("main".to_string(), PathBuf::from("src/main.js"));
        let graph = manifest.into_graph(Path::new("/app"), &entries).unwrap();

        assert_eq!(graph.len(), 3);
        let logo = graph.lookup(Path::new("/app/src/logo.png")).unwrap();
        assert_eq!(graph.module(logo).size, 2048);
        assert_eq!(graph.module(logo).kind, ModuleKind::Image);
    }

    #[test]
    fn explicit_kind_overrides_extension() {
        let manifest = GraphManifest::from_json(
            r#"{ "modules": [ { "path": "src/main.js", "kind": "typed-script" } ] }"#,
        )
        .unwrap();
        let mut entries = IndexMap::new();
        entries.insert("main".to_string(), PathBuf::from("src/main.js"));
        let graph = manifest.into_graph(Path::new("/app"), &entries).unwrap();
        assert_eq!(graph.modules()[0].kind, ModuleKind::TypedScript);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = GraphManifest::from_json(r#"{ "modules": [ { "path": "a.js", "sise": 1 } ] }"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidManifest(_)));
    }
}
