//! Terminal output: status lines and the build summary.
//!
//! Everything goes to stderr so `kiln build --dry-run` can pipe the plan on
//! stdout.

mod format;
mod messages;

use std::sync::atomic::{AtomicBool, Ordering};

pub use format::{SummaryRow, format_duration, format_size, print_build_summary};
pub use messages::{error, info, success, warning};

static QUIET: AtomicBool = AtomicBool::new(false);
static COLORS: AtomicBool = AtomicBool::new(true);

/// Apply the global `--quiet` and `--no-color` flags.
pub fn init(quiet: bool, no_color: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
    COLORS.store(!no_color && crate::logger::should_use_colors(), Ordering::Relaxed);
}

pub(crate) fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub(crate) fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}

/// Whether we are running under a CI system.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}
