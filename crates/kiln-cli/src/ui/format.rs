//! Formatting utilities for sizes, durations and build summaries.

use std::time::Duration;

use console::Term;
use owo_colors::OwoColorize;

use super::{colors_enabled, is_quiet};

/// Format a byte count with the most fitting unit.
///
/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format a duration as `50ms`, `1.50s` or `1m 30s`.
///
/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// One line of the build summary.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub path: String,
    pub size: u64,
    /// Bundle the file belongs to, if any.
    pub bundle: Option<String>,
}

/// Print the written files and their sizes to stderr.
pub fn print_build_summary(rows: &[SummaryRow], elapsed: Duration) {
    if is_quiet() {
        return;
    }
    let width = (Term::stderr().size().1 as usize).min(80);
    let color = colors_enabled();

    if color {
        eprintln!("\n{}", "Build Summary".bold().underline());
    } else {
        eprintln!("\nBuild Summary");
    }
    eprintln!("{}", "─".repeat(width));

    for row in rows {
        let size = format_size(row.size);
        let bundle = row.bundle.as_deref().map(|b| format!("[{b}]")).unwrap_or_default();
        if color {
            eprintln!(
                "  {} {} {} {}",
                "▸".blue(),
                row.path.bright_white().bold(),
                size.dimmed(),
                bundle.dimmed()
            );
        } else {
            eprintln!("  ▸ {} {} {}", row.path, size, bundle);
        }
    }

    eprintln!("{}", "─".repeat(width));
    let total: u64 = rows.iter().map(|r| r.size).sum();
    let files = format!("{} files", rows.len());
    if color {
        eprintln!(
            "  {} {} ({}) in {}",
            "Total:".bold(),
            format_size(total).green(),
            files,
            format_duration(elapsed).green()
        );
    } else {
        eprintln!("  Total: {} ({}) in {}", format_size(total), files, format_duration(elapsed));
    }
}
