//! Conversion from CLI errors to miette reports.

use miette::{Report, miette};

use crate::error::CliError;

/// Convert a [`CliError`] into a report for the terminal.
///
/// Core errors keep their diagnostic code and help text; configuration
/// errors carry their hint as help.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Core(e) => Report::new(e),
        CliError::Config(e) => match e.hint() {
            Some(hint) => miette!(code = "KILN::CONFIG", help = hint.to_string(), "Configuration error: {e}"),
            None => miette!(code = "KILN::CONFIG", "Configuration error: {e}"),
        },
        CliError::FileNotFound(path) => miette!(
            help = "Check the path, or pass --cwd to point at the project root",
            "File not found: {}",
            path.display()
        ),
        other => miette!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn core_errors_keep_their_code() {
        let report = cli_error_to_miette(CliError::Core(kiln_core::Error::UnclassifiedModule {
            path: PathBuf::from("/app/src/data.yaml"),
            kind: "other-binary".into(),
        }));
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("KILN::UNCLASSIFIED_MODULE"));
    }

    #[test]
    fn config_errors_carry_hints() {
        let report = cli_error_to_miette(CliError::Config(kiln_config::ConfigError::NotFound));
        let help = report.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("kiln.toml"));
    }
}
