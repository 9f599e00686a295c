use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::mode::{Mode, SourceMapFidelity, StyleExtraction};
use crate::module::{ModuleId, ModuleKind};
use crate::partition::BundleDescriptor;
use crate::rules::Pipeline;
use crate::template::FilenameTemplate;

/// Default asset inlining threshold, in bytes.
pub const DEFAULT_INLINE_THRESHOLD: u64 = 10 * 1024;

/// External minification backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Minimizer {
    Script,
    Style,
    Image,
}

/// Build-wide emission settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmissionSettings {
    pub clean_before_write: bool,
    pub asset_inline_threshold: u64,
    pub source_map: SourceMapFidelity,
    pub style_extraction: StyleExtraction,
    pub hot_reload: bool,
    pub minimizers: Vec<Minimizer>,
}

/// A graph module joined with its classification and bundle.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedModule {
    pub id: ModuleId,
    pub path: PathBuf,
    pub kind: ModuleKind,
    pub rule_index: usize,
    pub pipeline: Arc<Pipeline>,
    pub bundle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "template")]
pub enum AssetDisposition {
    /// Embedded into the referencing bundle as a data URL.
    Inline,
    /// Written as its own file.
    Emit(FilenameTemplate),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDescriptor {
    pub module: ModuleId,
    pub bundle: String,
    pub disposition: AssetDisposition,
}

/// Copy of the static directory into the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticCopy {
    pub from: PathBuf,
    /// Glob patterns excluded from the copy.
    pub ignore: Vec<String>,
    /// A missing source directory is not an error.
    pub allow_missing: bool,
}

/// The complete, validated output description of one build.
#[derive(Debug, Clone, Serialize)]
pub struct EmissionPlan {
    pub mode: Mode,
    pub bundles: Vec<BundleDescriptor>,
    /// All graph modules, in graph order.
    pub modules: Vec<PlannedModule>,
    pub assets: Vec<AssetDescriptor>,
    pub settings: EmissionSettings,
    pub static_copy: Option<StaticCopy>,
}

impl EmissionPlan {
    pub fn bundle(&self, name: &str) -> Option<&BundleDescriptor> {
        self.bundles.iter().find(|b| b.name == name)
    }

    pub fn module(&self, id: ModuleId) -> &PlannedModule {
        &self.modules[id.index()]
    }

    pub fn asset(&self, id: ModuleId) -> Option<&AssetDescriptor> {
        self.assets.iter().find(|a| a.module == id)
    }

    /// Bundles an HTML page for `entry` loads, in load order.
    pub fn load_order(&self, entry: &str) -> Vec<&BundleDescriptor> {
        let mut order: Vec<&BundleDescriptor> = self
            .bundles
            .iter()
            .filter(|b| b.is_runtime_only && b.entry.as_deref() == Some(entry))
            .collect();
        order.extend(
            self.bundles
                .iter()
                .filter(|b| b.entry.is_none() && !b.members.is_empty()),
        );
        order.extend(
            self.bundles
                .iter()
                .filter(|b| !b.is_runtime_only && b.entry.as_deref() == Some(entry)),
        );
        order
    }
}
