//! Bundle partitioning configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Emit a bootstrap-only `runtime~<entry>` bundle per entry.
    #[serde(default = "default_true")]
    pub runtime_bundle: bool,

    /// Start from the built-in `react` and `libs` groups.
    #[serde(default = "default_true")]
    pub builtin_groups: bool,

    /// Additional groups in declaration order, after the built-in ones.
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            runtime_bundle: true,
            builtin_groups: true,
            groups: Vec::new(),
        }
    }
}

/// A partition group. Exactly one of `pattern`, `packages` or
/// `dependencies` selects its modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group key, used in diagnostics.
    pub name: String,

    pub bundle: String,

    #[serde(default)]
    pub priority: i32,

    /// Regular expression over the absolute module path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Package names; a trailing `*` matches by prefix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,

    /// Match every dependency module.
    #[serde(default)]
    pub dependencies: bool,
}

impl GroupConfig {
    /// Number of selectors set; valid groups have exactly one.
    pub fn selector_count(&self) -> usize {
        usize::from(self.pattern.is_some()) + usize::from(!self.packages.is_empty()) + usize::from(self.dependencies)
    }
}

fn default_true() -> bool {
    true
}
