//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Filesystem validation errors
    #[error("entry path not found: {}", .path.display())]
    EntryNotFound { path: PathBuf },

    #[error("module graph manifest not found: {}", .path.display())]
    GraphNotFound { path: PathBuf },

    // Loading errors
    #[error("config not found")]
    NotFound,

    #[error("invalid config value for '{field}'")]
    InvalidValue { field: String, hint: Option<String> },

    #[error("invalid profile override: {message}")]
    InvalidProfileOverride { message: String },

    // Schema validation errors
    #[error("no entries specified")]
    NoEntries,

    #[error("schema validation failed: {message}")]
    SchemaValidation { message: String, hint: Option<String> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Suggested fix, when one is known.
    pub fn hint(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidValue { hint, .. } | ConfigError::SchemaValidation { hint, .. } => {
                hint.as_deref()
            }
            ConfigError::NotFound => Some("Create a kiln.toml or add a \"kiln\" field to package.json"),
            ConfigError::NoEntries => Some("Add at least one entry under [project.entries]"),
            ConfigError::GraphNotFound { .. } => {
                Some("Generate the module graph manifest or point [project].graph at it")
            }
            _ => None,
        }
    }
}
