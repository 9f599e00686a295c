pub mod config;
pub mod dev;
pub mod discovery;
pub mod error;
pub mod partition;
pub mod project;
pub mod rules;
pub mod settings;
pub mod validation;

pub use config::KilnConfig;
pub use dev::DevConfig;
pub use error::{ConfigError, Result};
pub use partition::{GroupConfig, PartitionConfig};
pub use project::{DEFAULT_ENTRY_NAME, EntryConfig, ProjectConfig};
pub use rules::{RuleConfig, RuleOutput};
pub use settings::{AssetsConfig, GlobalSettings};

pub use discovery::{CONFIG_FILE, ConfigDiscovery, PACKAGE_JSON_FIELD};
pub use validation::{ConfigValidator, FsValidator, SchemaValidator, validate_fs, validate_schema};
