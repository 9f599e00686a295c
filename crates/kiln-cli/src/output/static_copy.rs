//! Copying the static directory into the output root.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use kiln_core::emit::StaticCopy;
use tracing::debug;

use crate::error::{CliError, Result, ResultExt};
use crate::output::writer::validate_output_path;

/// Copy `copy.from` into `out_dir`, skipping the ignore patterns.
///
/// Hidden files and `.gitignore` rules are not applied; only the patterns
/// from the plan decide what is skipped. Returns the copied files relative
/// to `out_dir`.
pub fn copy_static(copy: &StaticCopy, out_dir: &Path) -> Result<Vec<PathBuf>> {
    if !copy.from.is_dir() {
        if copy.allow_missing {
            debug!(dir = %copy.from.display(), "no static directory, skipping copy");
            return Ok(Vec::new());
        }
        return Err(CliError::FileNotFound(copy.from.clone()));
    }

    let matcher = ignore_matcher(&copy.from, &copy.ignore)?;
    let walker = WalkBuilder::new(&copy.from).standard_filters(false).build();
    let mut copied = Vec::new();

    for entry in walker {
        let entry = entry.map_err(|e| CliError::Custom(format!("static copy: {e}")))?;
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if matcher.matched_path_or_any_parents(path, false).is_ignore() {
            debug!(file = %path.display(), "static file ignored");
            continue;
        }

        let Ok(relative) = path.strip_prefix(&copy.from) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        let target = validate_output_path(out_dir, &relative)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target).with_path(path)?;
        copied.push(PathBuf::from(relative));
    }

    debug!(files = copied.len(), from = %copy.from.display(), "static files copied");
    Ok(copied)
}

fn ignore_matcher(root: &Path, patterns: &[String]) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| CliError::InvalidArgument(format!("invalid static ignore pattern '{pattern}': {e}")))?;
    }
    builder
        .build()
        .map_err(|e| CliError::InvalidArgument(format!("invalid static ignore patterns: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn static_copy(from: PathBuf, ignore: &[&str], allow_missing: bool) -> StaticCopy {
        StaticCopy {
            from,
            ignore: ignore.iter().map(|s| s.to_string()).collect(),
            allow_missing,
        }
    }

    #[test]
    fn copies_everything_but_the_template() {
        let dir = TempDir::new().unwrap();
        let public = dir.path().join("public");
        fs::create_dir_all(public.join("img")).unwrap();
        fs::write(public.join("index.html"), "<html>").unwrap();
        fs::write(public.join("favicon.ico"), "ico").unwrap();
        fs::write(public.join("img/logo.svg"), "<svg/>").unwrap();
        fs::write(public.join(".well-known"), "x").unwrap();

        let out = dir.path().join("dist");
        let mut copied = copy_static(&static_copy(public, &["**/index.html"], true), &out).unwrap();
        copied.sort();

        assert_eq!(
            copied,
            vec![
                PathBuf::from(".well-known"),
                PathBuf::from("favicon.ico"),
                PathBuf::from("img/logo.svg")
            ]
        );
        assert!(!out.join("index.html").exists());
        assert_eq!(fs::read_to_string(out.join("img/logo.svg")).unwrap(), "<svg/>");
    }

    #[test]
    fn missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("public");
        assert!(copy_static(&static_copy(missing.clone(), &[], true), dir.path()).unwrap().is_empty());
        assert!(matches!(
            copy_static(&static_copy(missing, &[], false), dir.path()),
            Err(CliError::FileNotFound(_))
        ));
    }
}
