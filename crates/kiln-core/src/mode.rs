//! Build mode and the settings derived from it.
//!
//! All mode-dependent behaviour is decided in [`ModeSettings::resolve`]. The
//! rest of the core reads the resulting value and never looks at the mode
//! itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::template::FilenameTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Interpret a `NODE_ENV` value. `production` selects production, any
    /// other value selects development, and an unset variable selects nothing.
    pub fn from_node_env(value: Option<&str>) -> Option<Mode> {
        value.map(|v| {
            if v.trim() == "production" {
                Mode::Production
            } else {
                Mode::Development
            }
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }

    pub fn is_production(self) -> bool {
        self == Mode::Production
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(format!("unknown mode '{other}' (expected development or production)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleExtraction {
    /// Styles are injected by the script bundle at runtime.
    Inline,
    /// Styles are written to their own stylesheet per bundle.
    SeparateFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMapFidelity {
    None,
    /// Line-level maps, no column information.
    Cheap,
    Full,
}

impl SourceMapFidelity {
    pub fn enabled(self) -> bool {
        self != SourceMapFidelity::None
    }
}

/// Which kind of output file a template is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilenameKind {
    EntryScript,
    ChunkScript,
    EntryStyle,
    ChunkStyle,
    Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilenameTemplates {
    pub entry_script: FilenameTemplate,
    pub chunk_script: FilenameTemplate,
    pub entry_style: FilenameTemplate,
    pub chunk_style: FilenameTemplate,
    pub asset: FilenameTemplate,
}

impl FilenameTemplates {
    fn development() -> Self {
        Self {
            entry_script: FilenameTemplate::from_static("static/js/[name].js"),
            chunk_script: FilenameTemplate::from_static("static/js/[name].chunk.js"),
            entry_style: FilenameTemplate::from_static("static/css/[name].css"),
            chunk_style: FilenameTemplate::from_static("static/css/[name].chunk.css"),
            asset: FilenameTemplate::from_static("static/media/[hash:10][ext][query]"),
        }
    }

    fn production() -> Self {
        Self {
            entry_script: FilenameTemplate::from_static("static/js/[name].[contenthash:10].js"),
            chunk_script: FilenameTemplate::from_static("static/js/[name].[contenthash:10].chunk.js"),
            entry_style: FilenameTemplate::from_static("static/css/[name].[contenthash:10].css"),
            chunk_style: FilenameTemplate::from_static("static/css/[name].[contenthash:10].chunk.css"),
            asset: FilenameTemplate::from_static("static/media/[hash:10][ext][query]"),
        }
    }

    pub fn get(&self, kind: FilenameKind) -> &FilenameTemplate {
        match kind {
            FilenameKind::EntryScript => &self.entry_script,
            FilenameKind::ChunkScript => &self.chunk_script,
            FilenameKind::EntryStyle => &self.entry_style,
            FilenameKind::ChunkStyle => &self.chunk_style,
            FilenameKind::Asset => &self.asset,
        }
    }
}

/// Everything that differs between development and production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeSettings {
    pub mode: Mode,
    pub style_extraction: StyleExtraction,
    pub templates: FilenameTemplates,
    pub minify_enabled: bool,
    pub source_map: SourceMapFidelity,
    pub hot_reload_enabled: bool,
    /// Empty the output root before writing.
    pub clean_output: bool,
    /// Copy the static directory into the output root.
    pub copy_static: bool,
}

impl ModeSettings {
    pub fn resolve(mode: Mode) -> Self {
        match mode {
            Mode::Development => Self {
                mode,
                style_extraction: StyleExtraction::Inline,
                templates: FilenameTemplates::development(),
                minify_enabled: false,
                source_map: SourceMapFidelity::Cheap,
                hot_reload_enabled: true,
                clean_output: true,
                copy_static: false,
            },
            Mode::Production => Self {
                mode,
                style_extraction: StyleExtraction::SeparateFile,
                templates: FilenameTemplates::production(),
                minify_enabled: true,
                source_map: SourceMapFidelity::Full,
                hot_reload_enabled: false,
                clean_output: true,
                copy_static: true,
            },
        }
    }

    pub fn filename_template(&self, kind: FilenameKind) -> &FilenameTemplate {
        self.templates.get(kind)
    }

    /// Conventional devtool name for the source-map setting.
    pub fn devtool(&self) -> Option<&'static str> {
        match self.source_map {
            SourceMapFidelity::None => None,
            SourceMapFidelity::Cheap => Some("cheap-module-source-map"),
            SourceMapFidelity::Full => Some("source-map"),
        }
    }
}
