//! Atomic output writing.
//!
//! All files are first written next to their targets with a `.kiln-tmp`
//! suffix and only renamed into place once every write succeeded. A failed
//! write removes the temporary files, so the output root never holds a
//! half-written build.

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, warn};

use crate::error::{CliError, Result};
use crate::render::OutputFile;

const TEMP_SUFFIX: &str = "kiln-tmp";
const OLD_SUFFIX: &str = "kiln-old";

/// Write `files` below `out_dir`, all or nothing.
pub fn write_files(out_dir: &Path, files: &[OutputFile]) -> Result<()> {
    let out_dir = out_dir.clean();
    fs::create_dir_all(&out_dir).map_err(|e| {
        CliError::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            out_dir.display(),
            e
        ))
    })?;

    let operations = files
        .iter()
        .map(|file| Ok((validate_output_path(&out_dir, &file.path)?, file.contents.as_slice())))
        .collect::<Result<Vec<_>>>()?;

    write_atomic(&operations)?;
    debug!(files = operations.len(), dir = %out_dir.display(), "output written");
    Ok(())
}

/// Resolve `relative` under `base`, rejecting anything that escapes it.
pub fn validate_output_path(base: &Path, relative: &str) -> Result<PathBuf> {
    if relative.contains('\0') {
        return Err(CliError::InvalidOutputPath("file name contains a null byte".to_string()));
    }
    if Path::new(relative).is_absolute() {
        return Err(CliError::InvalidOutputPath(format!("'{relative}' is absolute")));
    }

    let full = base.join(Path::new(relative).clean()).clean();
    if !full.starts_with(base) || full == base {
        return Err(CliError::InvalidOutputPath(format!(
            "'{}' escapes output directory '{}'",
            relative,
            base.display()
        )));
    }
    Ok(full)
}

/// Refuse output directories that would swallow project inputs.
///
/// Cleaning the output root must never delete sources. The project root and
/// its ancestors are rejected, and so is any directory that holds one of
/// `inputs` or sits inside one.
pub fn validate_output_dir(out_dir: &Path, root: &Path, inputs: &[PathBuf]) -> Result<()> {
    let out_dir = out_dir.clean();
    if root.starts_with(&out_dir) {
        return Err(CliError::InvalidOutputPath(format!(
            "output directory '{}' contains the project root",
            out_dir.display()
        )));
    }
    if let Some(input) = inputs
        .iter()
        .map(|input| input.clean())
        .find(|input| input.starts_with(&out_dir) || out_dir.starts_with(input))
    {
        return Err(CliError::InvalidOutputPath(format!(
            "overlaps project input: output '{}', input '{}'",
            out_dir.display(),
            input.display()
        )));
    }
    if out_dir.exists() && !out_dir.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Output path exists but is not a directory: {}",
            out_dir.display()
        )));
    }
    Ok(())
}

/// Replace `out_dir` with a freshly staged directory.
///
/// `stage` fills a sibling directory. Only once it succeeds is the old
/// output swapped out and removed, so a failed build leaves the previous
/// output untouched.
pub fn replace_output_dir<T>(out_dir: &Path, stage: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let out_dir = out_dir.clean();
    let staging = sibling(&out_dir, TEMP_SUFFIX);
    let previous = sibling(&out_dir, OLD_SUFFIX);

    remove_dir_if_exists(&staging)?;
    fs::create_dir_all(&staging).map_err(|e| {
        CliError::WriteFailure(format!(
            "Failed to create staging directory '{}': {}",
            staging.display(),
            e
        ))
    })?;

    let value = match stage(&staging) {
        Ok(value) => value,
        Err(e) => {
            discard(&staging);
            return Err(e);
        }
    };

    if out_dir.exists() {
        remove_dir_if_exists(&previous)?;
        if let Err(e) = fs::rename(&out_dir, &previous) {
            discard(&staging);
            return Err(CliError::WriteFailure(format!(
                "Failed to move '{}' aside: {}",
                out_dir.display(),
                e
            )));
        }
    }
    if let Err(e) = fs::rename(&staging, &out_dir) {
        if previous.exists() {
            let _ = fs::rename(&previous, &out_dir);
        }
        discard(&staging);
        return Err(CliError::WriteFailure(format!(
            "Failed to move build into '{}': {}",
            out_dir.display(),
            e
        )));
    }
    discard(&previous);

    debug!(dir = %out_dir.display(), "output directory replaced");
    Ok(value)
}

/// Hidden directory next to `dir`, e.g. `.dist.kiln-tmp`.
fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(dir.file_name().unwrap_or_default());
    name.push(".");
    name.push(suffix);
    dir.with_file_name(name)
}

fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    Ok(())
}

fn discard(dir: &Path) {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!(path = %dir.display(), error = %e, "failed to remove directory");
        }
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(TEMP_SUFFIX);
    target.with_file_name(name)
}

fn write_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut written: Vec<(PathBuf, &Path)> = Vec::with_capacity(operations.len());

    for (target, contents) in operations {
        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                cleanup(&written);
                return Err(CliError::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                )));
            }
        }

        let temp = temp_path(target);
        if let Err(e) = fs::write(&temp, contents) {
            cleanup(&written);
            return Err(CliError::WriteFailure(format!(
                "Failed to write '{}': {}",
                temp.display(),
                e
            )));
        }
        written.push((temp, target.as_path()));
    }

    for (temp, target) in &written {
        if let Err(e) = fs::rename(temp, target) {
            cleanup(&written);
            return Err(CliError::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp.display(),
                target.display(),
                e
            )));
        }
    }
    Ok(())
}

fn cleanup(written: &[(PathBuf, &Path)]) {
    for (temp, _) in written {
        if temp.exists() {
            if let Err(e) = fs::remove_file(temp) {
                warn!(path = %temp.display(), error = %e, "failed to remove temporary file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(path: &str, contents: &str) -> OutputFile {
        OutputFile {
            path: path.to_string(),
            contents: contents.as_bytes().to_vec(),
            bundle: None,
        }
    }

    #[test]
    fn nested_paths_resolve_under_base() {
        let base = Path::new("/tmp/out");
        assert_eq!(
            validate_output_path(base, "static/js/main.js").unwrap(),
            Path::new("/tmp/out/static/js/main.js")
        );
        assert_eq!(validate_output_path(base, "./index.html").unwrap(), Path::new("/tmp/out/index.html"));
    }

    #[test]
    fn traversal_is_rejected() {
        let base = Path::new("/tmp/out");
        for bad in ["../etc/passwd", "static/../../../etc/passwd", "/etc/passwd", "a\0b", "."] {
            assert!(
                matches!(validate_output_path(base, bad), Err(CliError::InvalidOutputPath(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn writes_all_files_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        write_files(&out, &[file("index.html", "<html>"), file("static/js/main.js", "1;")]).unwrap();

        assert_eq!(fs::read_to_string(out.join("static/js/main.js")).unwrap(), "1;");
        assert!(!out.join("index.html.kiln-tmp").exists());
    }

    #[test]
    fn failed_write_leaves_no_temporaries() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        // a file where a directory is needed
        fs::write(out.join("static"), "x").unwrap();

        let err = write_files(&out, &[file("index.html", "<html>"), file("static/js/main.js", "1;")]).unwrap_err();
        assert!(matches!(err, CliError::WriteFailure(_)));
        assert!(!out.join("index.html").exists());
        assert!(!out.join("index.html.kiln-tmp").exists());
    }

    #[test]
    fn output_dir_must_not_contain_root() {
        let root = Path::new("/work/app");
        assert!(validate_output_dir(Path::new("/work/app/dist"), root, &[]).is_ok());
        assert!(validate_output_dir(Path::new("/work/app"), root, &[]).is_err());
        assert!(validate_output_dir(Path::new("/work"), root, &[]).is_err());
    }

    #[test]
    fn output_dir_must_not_overlap_inputs() {
        let root = Path::new("/work/app");
        let inputs = [
            PathBuf::from("/work/app/src"),
            PathBuf::from("/work/app/public"),
            PathBuf::from("/work/app/public/index.html"),
            PathBuf::from("/work/app/kiln-graph.json"),
        ];
        assert!(validate_output_dir(Path::new("/work/app/dist"), root, &inputs).is_ok());
        for bad in ["/work/app/src", "/work/app/src/out", "/work/app/public", "/work/app/public/../src"] {
            assert!(
                matches!(
                    validate_output_dir(Path::new(bad), root, &inputs),
                    Err(CliError::InvalidOutputPath(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn replace_swaps_in_the_staged_build() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.html"), "").unwrap();

        let count = replace_output_dir(&out, |staging| {
            write_files(staging, &[file("index.html", "<html>")])?;
            Ok(1)
        })
        .unwrap();

        assert_eq!(count, 1);
        assert!(!out.join("stale.html").exists());
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "<html>");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_stage_keeps_previous_output() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("previous.txt"), "kept").unwrap();

        let err = replace_output_dir(&out, |staging| -> Result<()> {
            write_files(staging, &[file("index.html", "<html>")])?;
            Err(CliError::WriteFailure("disk full".to_string()))
        })
        .unwrap_err();

        assert!(matches!(err, CliError::WriteFailure(_)));
        assert_eq!(fs::read_to_string(out.join("previous.txt")).unwrap(), "kept");
        assert!(!out.join("index.html").exists());
        assert!(!dir.path().join(".dist.kiln-tmp").exists());
    }

    #[test]
    fn replace_creates_missing_output() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("build");
        replace_output_dir(&out, |staging| write_files(staging, &[file("a.js", "1;")])).unwrap();
        assert_eq!(fs::read_to_string(out.join("a.js")).unwrap(), "1;");
    }
}
