//! Error handling for the kiln CLI.
//!
//! [`CliError`] wraps the core and configuration errors and adds the
//! failures that only the binary can hit: I/O, the dev server and the file
//! watcher. `main` turns it into a `miette` report.
//!
//! ```rust,no_run
//! use kiln_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_graph(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path).with_path(path)
//! }
//! ```

mod miette;

use std::path::PathBuf;

use thiserror::Error;

pub use self::miette::cli_error_to_miette;

#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration, transform and partition errors from the core
    #[error(transparent)]
    Core(#[from] kiln_core::Error),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] kiln_config::ConfigError),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Output path escaping the output directory
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("Failed to write output: {0}")]
    WriteFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// Configuration problems exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::InvalidArgument(_) => 2,
            CliError::Core(err) if err.category() == kiln_core::ErrorCategory::Configuration => 2,
            _ => 1,
        }
    }
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Adds context to `Result`s on their way up.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            CliError::Io(io_err) => CliError::Custom(format!("{}: {}", path.as_ref().display(), io_err)),
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{err}\n\nHint: {hint}"))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{msg}: {err}"))
        })
    }
}
