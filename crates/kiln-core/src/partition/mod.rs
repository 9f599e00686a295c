//! Output partitioning: which module lands in which bundle.

mod planner;
mod rule;

use indexmap::IndexMap;
use serde::Serialize;

use crate::module::ModuleId;
use crate::template::FilenameTemplate;

pub use planner::plan;
pub use rule::{PartitionRule, PartitionRules, PartitionTest, RUNTIME_PREFIX, runtime_bundle_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleKind {
    /// Holds an entry module and everything it owns that no rule claimed.
    Entry,
    /// Created by a partition rule.
    Split,
    /// Bootstrap code only; never has graph members.
    Runtime,
}

/// One output bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleDescriptor {
    pub name: String,
    pub kind: BundleKind,
    /// Entry this bundle belongs to, for entry and runtime bundles.
    pub entry: Option<String>,
    /// Members in graph order.
    pub members: Vec<ModuleId>,
    pub filename_template: FilenameTemplate,
    /// Stylesheet template, set when styles are extracted and the bundle has any.
    pub style_template: Option<FilenameTemplate>,
    pub source_map: bool,
    pub is_runtime_only: bool,
}

impl BundleDescriptor {
    pub fn contains(&self, id: ModuleId) -> bool {
        self.members.contains(&id)
    }
}

/// Bundles keyed by name, in emission order: runtime bundles, then split
/// bundles, then entry bundles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PartitionMap {
    bundles: IndexMap<String, BundleDescriptor>,
}

impl PartitionMap {
    pub fn from_bundles(bundles: impl IntoIterator<Item = BundleDescriptor>) -> Self {
        Self {
            bundles: bundles.into_iter().map(|b| (b.name.clone(), b)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BundleDescriptor> {
        self.bundles.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BundleDescriptor> {
        self.bundles.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Name of the bundle that holds `id`.
    pub fn bundle_of(&self, id: ModuleId) -> Option<&str> {
        self.bundles
            .values()
            .find(|bundle| bundle.contains(id))
            .map(|bundle| bundle.name.as_str())
    }

    pub fn into_bundles(self) -> Vec<BundleDescriptor> {
        self.bundles.into_values().collect()
    }
}
