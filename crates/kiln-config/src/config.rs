//! Top-level configuration and profile merging.
//!
//! For reading configuration from disk, see the `discovery` module.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dev::DevConfig;
use crate::error::{ConfigError, Result};
use crate::partition::PartitionConfig;
use crate::project::ProjectConfig;
use crate::rules::RuleConfig;
use crate::settings::{AssetsConfig, GlobalSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KilnConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    /// Keep the built-in transform rules after the user's own.
    #[serde(default = "default_true")]
    pub builtin_rules: bool,

    /// User rules, matched before the built-in ones.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    #[serde(default)]
    pub partition: PartitionConfig,

    #[serde(default)]
    pub assets: AssetsConfig,

    #[serde(default)]
    pub dev: DevConfig,

    #[serde(default)]
    pub settings: GlobalSettings,

    /// Partial overrides keyed by mode name (`development`, `production`).
    #[serde(default)]
    pub profiles: HashMap<String, Value>,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            builtin_rules: true,
            rules: Vec::new(),
            partition: PartitionConfig::default(),
            assets: AssetsConfig::default(),
            dev: DevConfig::default(),
            settings: GlobalSettings::default(),
            profiles: HashMap::new(),
        }
    }
}

impl KilnConfig {
    /// Build from an already-parsed JSON value.
    ///
    /// ```
    /// use kiln_config::KilnConfig;
    /// use serde_json::json;
    ///
    /// let config = KilnConfig::from_value(json!({
    ///     "project": { "entries": ["src/app.tsx"] },
    ///     "assets": { "inline_threshold": 4096 }
    /// }))
    /// .unwrap();
    /// assert_eq!(config.assets.inline_threshold, 4096);
    /// ```
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Deep-merge the overrides of `profile` into this configuration.
    ///
    /// Objects merge key by key; arrays and scalars replace. An unknown
    /// profile leaves the configuration unchanged.
    pub fn materialize_profile(self, profile: Option<&str>) -> Result<Self> {
        let Some(overrides) = profile.and_then(|name| self.profiles.get(name)).cloned() else {
            return Ok(self);
        };
        if overrides.is_null() {
            return Ok(self);
        }
        if !overrides.is_object() {
            return Err(ConfigError::InvalidProfileOverride {
                message: format!("profile '{}' must be a table", profile.unwrap_or_default()),
            });
        }

        let profiles = self.profiles.clone();
        let mut base = serde_json::to_value(&self).map_err(|err| ConfigError::InvalidProfileOverride {
            message: err.to_string(),
        })?;
        merge_values(&mut base, &overrides);

        let mut merged: KilnConfig =
            serde_json::from_value(base).map_err(|err| ConfigError::InvalidProfileOverride {
                message: err.to_string(),
            })?;
        merged.profiles = profiles;
        Ok(merged)
    }
}

fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn from_value_creates_config() {
        let config = KilnConfig::from_value(json!({
            "project": {
                "entries": [{ "name": "main", "path": "src/index.tsx" }],
                "output_dir": "build"
            }
        }))
        .unwrap();
        assert_eq!(
            config.project.effective_entries()["main"],
            PathBuf::from("src/index.tsx")
        );
        assert_eq!(config.project.output_dir, PathBuf::from("build"));
        assert!(config.builtin_rules);
    }

    #[test]
    fn profile_overrides_nested_values() {
        let config = KilnConfig::from_value(json!({
            "dev": { "port": 3000, "open": true },
            "assets": { "inline_threshold": 1024 },
            "profiles": {
                "development": { "dev": { "port": 4000 } },
                "production": { "assets": { "inline_threshold": 8192 } }
            }
        }))
        .unwrap();

        let dev = config.clone().materialize_profile(Some("development")).unwrap();
        assert_eq!(dev.dev.port, 4000);
        assert!(dev.dev.open);
        assert_eq!(dev.assets.inline_threshold, 1024);

        let prod = config.materialize_profile(Some("production")).unwrap();
        assert_eq!(prod.dev.port, 3000);
        assert_eq!(prod.assets.inline_threshold, 8192);
        assert_eq!(prod.profiles.len(), 2);
    }

    #[test]
    fn profile_arrays_replace() {
        let config = KilnConfig::from_value(json!({
            "dev": { "watch_ignore": ["tmp", "coverage"] },
            "profiles": { "development": { "dev": { "watch_ignore": ["logs"] } } }
        }))
        .unwrap()
        .materialize_profile(Some("development"))
        .unwrap();
        assert_eq!(config.dev.watch_ignore, vec!["logs".to_string()]);
    }

    #[test]
    fn unknown_profile_is_noop() {
        let config = KilnConfig::default();
        let same = config.clone().materialize_profile(Some("staging")).unwrap();
        assert_eq!(config, same);
    }

    #[test]
    fn scalar_profile_is_rejected() {
        let config = KilnConfig::from_value(json!({ "profiles": { "production": 3 } })).unwrap();
        assert!(matches!(
            config.materialize_profile(Some("production")),
            Err(ConfigError::InvalidProfileOverride { .. })
        ));
    }
}
