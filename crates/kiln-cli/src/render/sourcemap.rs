//! Source map documents for emitted bundles.
//!
//! Maps list their sources; full fidelity also embeds the original source
//! text. Segment mappings are produced by the transform stages that know
//! them, so the `mappings` field starts empty.

use kiln_core::SourceMapFidelity;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub source_root: String,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn new(file: impl Into<String>, fidelity: SourceMapFidelity) -> Self {
        Self {
            version: 3,
            file: file.into(),
            source_root: String::new(),
            sources: Vec::new(),
            sources_content: matches!(fidelity, SourceMapFidelity::Full).then(Vec::new),
            names: Vec::new(),
            mappings: String::new(),
        }
    }

    pub fn add_source(&mut self, name: impl Into<String>, content: &[u8]) {
        self.sources.push(name.into());
        if let Some(contents) = &mut self.sources_content {
            contents.push(String::from_utf8_lossy(content).into_owned());
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Trailing comment pointing a script at its map.
pub fn script_reference(map_file_name: &str) -> String {
    format!("//# sourceMappingURL={map_file_name}\n")
}

/// Trailing comment pointing a stylesheet at its map.
pub fn style_reference(map_file_name: &str) -> String {
    format!("/*# sourceMappingURL={map_file_name} */\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cheap_maps_omit_sources_content() {
        let mut map = SourceMap::new("main.js", SourceMapFidelity::Cheap);
        map.add_source("kiln:///./src/main.js", b"let a = 1;");
        let json: serde_json::Value = serde_json::from_slice(&map.to_json().unwrap()).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["sources"][0], "kiln:///./src/main.js");
        assert!(json.get("sourcesContent").is_none());
    }

    #[test]
    fn full_maps_embed_sources() {
        let mut map = SourceMap::new("main.js", SourceMapFidelity::Full);
        map.add_source("./src/main.js", b"let a = 1;");
        let json: serde_json::Value = serde_json::from_slice(&map.to_json().unwrap()).unwrap();
        assert_eq!(json["sourcesContent"][0], "let a = 1;");
        assert_eq!(json["sourceRoot"], "");
    }
}
