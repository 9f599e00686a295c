//! Asset handling and global settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Images at or below this many bytes are inlined as data URLs.
    #[serde(default = "default_inline_threshold")]
    pub inline_threshold: u64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            inline_threshold: default_inline_threshold(),
        }
    }
}

fn default_inline_threshold() -> u64 {
    10 * 1024
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// `tracing` filter directive used when neither `--verbose` nor `RUST_LOG` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}
