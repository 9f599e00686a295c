//! File-based config discovery.
//!
//! Finds and loads kiln configuration from a project root. Values are
//! layered with `figment`: built-in defaults first, then the file.

use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml};
use serde_json::Value;
use tracing::debug;

use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};

/// Name of the TOML configuration file.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Field holding kiln configuration inside `package.json`.
pub const PACKAGE_JSON_FIELD: &str = "kiln";

/// Searches a project root for configuration.
///
/// ```no_run
/// use kiln_config::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new(".").load_or_default().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Locate a config file. `kiln.toml` wins over a `"kiln"` field in
    /// `package.json`.
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(CONFIG_FILE);
        if toml_path.is_file() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join("package.json");
        let content = fs::read_to_string(&pkg_path).ok()?;
        let parsed = serde_json::from_str::<Value>(&content).ok()?;
        match parsed.get(PACKAGE_JSON_FIELD) {
            Some(value) if !value.is_null() => Some(pkg_path),
            _ => None,
        }
    }

    /// Load the discovered config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when there is nothing to load.
    pub fn load(&self) -> Result<KilnConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        self.load_from(&path)
    }

    /// Load the discovered config, or the defaults when there is none.
    pub fn load_or_default(&self) -> Result<KilnConfig> {
        match self.load() {
            Err(ConfigError::NotFound) => {
                debug!(root = %self.root.display(), "no config found, using defaults");
                Ok(KilnConfig::default())
            }
            other => other,
        }
    }

    /// Load and apply the overrides for `profile`.
    pub fn load_with_profile(&self, profile: &str) -> Result<KilnConfig> {
        self.load_or_default()?.materialize_profile(Some(profile))
    }

    /// Load a specific file.
    pub fn load_from(&self, path: &Path) -> Result<KilnConfig> {
        debug!(path = %path.display(), "loading config");
        let figment = Figment::from(Serialized::defaults(KilnConfig::default()));

        let figment = if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
            figment.merge(Json::string(&self.package_json_field(path)?.to_string()))
        } else {
            if !path.is_file() {
                return Err(ConfigError::NotFound);
            }
            figment.merge(Toml::file(path))
        };

        figment.extract().map_err(|e| ConfigError::InvalidValue {
            field: path.display().to_string(),
            hint: Some(e.to_string()),
        })
    }

    fn package_json_field(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        let mut parsed: Value = serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
            field: "package.json".to_string(),
            hint: Some(format!("Invalid JSON: {e}")),
        })?;

        match parsed.get_mut(PACKAGE_JSON_FIELD).map(Value::take) {
            Some(value) if value.is_object() => Ok(value),
            Some(_) => Err(ConfigError::InvalidValue {
                field: PACKAGE_JSON_FIELD.to_string(),
                hint: Some("The 'kiln' field in package.json must be an object".to_string()),
            }),
            None => Err(ConfigError::InvalidValue {
                field: PACKAGE_JSON_FIELD.to_string(),
                hint: Some("Add a 'kiln' field to your package.json".to_string()),
            }),
        }
    }
}
