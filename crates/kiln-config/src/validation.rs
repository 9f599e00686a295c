//! Pluggable config validation strategies.
//!
//! Schema validation checks the configuration on its own; filesystem
//! validation additionally checks that referenced files exist.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};

/// Bundle names with this prefix are reserved for runtime bundles.
const RESERVED_BUNDLE_PREFIX: &str = "runtime~";

const PRIORITY_RANGE: std::ops::RangeInclusive<i32> = -1000..=1000;

pub trait ConfigValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()>;
}

/// Schema-only validation (no filesystem checks).
///
/// ```
/// use kiln_config::{ConfigValidator, KilnConfig, SchemaValidator};
///
/// SchemaValidator.validate(&KilnConfig::default()).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()> {
        let entries = config.project.effective_entries();
        if entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }
        if entries.len() != config.project.entries.len() && !config.project.entries.is_empty() {
            return Err(schema_error(
                "two entries share the same name",
                "Give entries with the same file stem explicit names: { name = \"...\", path = \"...\" }",
            ));
        }
        for (name, path) in &entries {
            if name.trim().is_empty() || name.starts_with(RESERVED_BUNDLE_PREFIX) {
                return Err(schema_error(
                    format!("invalid entry name '{name}'"),
                    "Entry names must be non-empty and must not start with 'runtime~'",
                ));
            }
            if path.as_os_str().is_empty() {
                return Err(schema_error(
                    format!("entry '{name}' has an empty path"),
                    "Point each entry at a module relative to the project root",
                ));
            }
        }

        if !config.builtin_rules && config.rules.is_empty() {
            return Err(schema_error(
                "built-in rules are disabled and no [[rules]] are declared",
                "Declare at least one [[rules]] entry or set builtin_rules = true",
            ));
        }
        for rule in &config.rules {
            if rule.name.trim().is_empty() {
                return Err(schema_error("rule name cannot be empty", "Give every [[rules]] entry a name"));
            }
            if rule.extensions.is_empty() {
                return Err(schema_error(
                    format!("rule '{}' has no extensions", rule.name),
                    "List the file extensions the rule applies to, e.g. extensions = [\"md\"]",
                ));
            }
            if let Some(stage) = rule.stages.iter().find(|s| s.trim().is_empty()) {
                return Err(schema_error(
                    format!("rule '{}' has an empty stage name '{stage}'", rule.name),
                    "Remove empty strings from the 'stages' array",
                ));
            }
        }

        for group in &config.partition.groups {
            let key = &group.name;
            if group.bundle.trim().is_empty() {
                return Err(schema_error(
                    format!("partition group '{key}' has an empty bundle name"),
                    "Set 'bundle' to the output bundle name",
                ));
            }
            if group.bundle.starts_with(RESERVED_BUNDLE_PREFIX) {
                return Err(schema_error(
                    format!("partition group '{key}' targets reserved bundle '{}'", group.bundle),
                    "Bundle names starting with 'runtime~' are reserved for runtime bundles",
                ));
            }
            if group.selector_count() != 1 {
                return Err(schema_error(
                    format!("partition group '{key}' must set exactly one of pattern, packages or dependencies"),
                    "Pick a single selector for the group",
                ));
            }
            if let Some(pattern) = &group.pattern {
                if let Err(e) = Regex::new(pattern) {
                    return Err(schema_error(
                        format!("partition group '{key}' has an invalid pattern: {e}"),
                        "Check the regular expression syntax",
                    ));
                }
            }
            if !PRIORITY_RANGE.contains(&group.priority) {
                return Err(schema_error(
                    format!("partition group '{key}' priority {} is out of range", group.priority),
                    "Use a priority between -1000 and 1000",
                ));
            }
        }

        if config.dev.port == 0 {
            return Err(schema_error("dev port cannot be 0", "Pick a port such as 3000"));
        }

        Ok(())
    }
}

/// Filesystem validator (for CLI use).
pub struct FsValidator {
    root: PathBuf,
}

impl FsValidator {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()> {
        SchemaValidator.validate(config)?;

        for path in config.project.effective_entries().values() {
            let path = self.root.join(path);
            if !path.is_file() {
                return Err(ConfigError::EntryNotFound { path });
            }
        }

        let graph = self.root.join(&config.project.graph);
        if !graph.is_file() {
            return Err(ConfigError::GraphNotFound { path: graph });
        }

        Ok(())
    }
}

pub fn validate_schema(config: &KilnConfig) -> Result<()> {
    SchemaValidator.validate(config)
}

pub fn validate_fs(config: &KilnConfig, root: impl AsRef<Path>) -> Result<()> {
    FsValidator::new(root).validate(config)
}

fn schema_error(message: impl Into<String>, hint: &str) -> ConfigError {
    ConfigError::SchemaValidation {
        message: message.into(),
        hint: Some(hint.to_string()),
    }
}
