//! Logging setup for the kiln CLI.
//!
//! Library crates only emit `tracing` events; the binary decides what is shown.
//!
//! ```rust,no_run
//! use kiln_cli::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false, None);
//! info!("Starting build");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "kiln=debug,kiln_core=debug,kiln_config=debug,kiln_cli=debug";
const QUIET_FILTER: &str = "kiln=error,kiln_core=error,kiln_config=error,kiln_cli=error";
const DEFAULT_FILTER: &str = "kiln=info,kiln_core=info,kiln_config=info,kiln_cli=info";

/// Initialize the global tracing subscriber.
///
/// Filter precedence:
/// 1. `--verbose`: debug for kiln crates
/// 2. `--quiet`: errors only
/// 3. `RUST_LOG`
/// 4. `[settings].log_level` from the configuration
/// 5. info for kiln crates
///
/// Calling this twice is harmless; the second subscriber is dropped.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool, config_level: Option<&str>) {
    let filter = build_filter(verbose, quiet, config_level);

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

fn build_filter(verbose: bool, quiet: bool, config_level: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new(VERBOSE_FILTER);
    }
    if quiet {
        return EnvFilter::new(QUIET_FILTER);
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    config_level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Whether colored output should be used.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them, otherwise the
/// terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn filters_parse() {
        let _ = EnvFilter::new(VERBOSE_FILTER);
        let _ = EnvFilter::new(QUIET_FILTER);
        let _ = EnvFilter::new(DEFAULT_FILTER);
    }

    #[test]
    #[serial]
    fn verbose_wins_over_config_level() {
        let filter = build_filter(true, false, Some("kiln=warn"));
        assert!(filter.to_string().contains("kiln_core=debug"));
    }

    #[test]
    #[serial]
    fn config_level_used_without_rust_log() {
        // SAFETY: serialized with the other environment tests.
        unsafe { std::env::remove_var("RUST_LOG") };
        let filter = build_filter(false, false, Some("kiln_core=trace"));
        assert!(filter.to_string().contains("kiln_core=trace"));
    }

    #[test]
    #[serial]
    fn no_color_disables_colors() {
        // SAFETY: serialized with the other environment tests.
        unsafe {
            std::env::set_var("NO_COLOR", "1");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(!should_use_colors());
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::remove_var("FORCE_COLOR");
        }
    }
}
