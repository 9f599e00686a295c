//! Error types for classification, partitioning and emission.
//!
//! Every variant is fatal for the build that raised it. [`Error::category`]
//! groups variants into the three families the CLI reports on:
//! configuration problems, transform failures, and partition invariant
//! violations (which indicate a planner bug rather than bad input).

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for kiln-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad error family, used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad rules, bad graph, bad templates. Nothing was written.
    Configuration,
    /// An external transform stage rejected a module's source.
    Transform,
    /// Completeness or disjointness of the partition was violated.
    PartitionInvariant,
}

#[derive(Debug, Error)]
pub enum Error {
    /// No transform rule matched the module.
    #[error("no transform rule matches {} (type: {kind})", .path.display())]
    UnclassifiedModule { path: PathBuf, kind: String },

    /// Two partition rules with the same top priority matched one module.
    #[error(
        "ambiguous partition for {}: rules #{first_rule} ({first_bundle}) and #{second_rule} ({second_bundle}) both match with priority {priority}",
        .path.display()
    )]
    AmbiguousPartition {
        path: PathBuf,
        priority: i32,
        first_rule: usize,
        first_bundle: String,
        second_rule: usize,
        second_bundle: String,
    },

    /// A partition rule targets a bundle name reserved for a runtime bundle.
    #[error("partition rule #{rule} targets reserved runtime bundle '{bundle}'")]
    ReservedBundleName { rule: usize, bundle: String },

    /// A rule definition could not be compiled.
    #[error("invalid rule #{rule} ({name}): {message}")]
    InvalidRule {
        rule: usize,
        name: String,
        message: String,
    },

    /// A filename template uses a placeholder we do not know.
    #[error("invalid filename template '{template}': unknown placeholder [{placeholder}]")]
    InvalidTemplate {
        template: String,
        placeholder: String,
    },

    /// The same path was registered twice in the module graph.
    #[error("duplicate module in graph: {}", .0.display())]
    DuplicateModule(PathBuf),

    /// An entry point refers to a path that is not in the graph.
    #[error("entry '{name}' points at {} which is not in the module graph", .path.display())]
    UnknownEntry { name: String, path: PathBuf },

    /// An import edge refers to a path that is not in the graph.
    #[error("{} imports {} which is not in the module graph", .from.display(), .to.display())]
    UnknownImport { from: PathBuf, to: PathBuf },

    /// A module cannot be reached from any entry point.
    #[error("module {} is not reachable from any entry point", .0.display())]
    UnreachableModule(PathBuf),

    /// The graph has no entry points.
    #[error("module graph has no entry points")]
    NoEntries,

    /// The module graph manifest could not be parsed.
    #[error("invalid module graph manifest: {0}")]
    InvalidManifest(String),

    /// An external transform stage failed.
    #[error("transform stage '{stage}' failed for {}: {message}", .path.display())]
    Transform {
        path: PathBuf,
        stage: String,
        message: String,
    },

    /// A graph module is missing from every bundle.
    #[error("module {} was not assigned to any bundle", .path.display())]
    IncompletePartition { path: PathBuf },

    /// A graph module is a member of more than one bundle.
    #[error("module {} is assigned to both '{first}' and '{second}'", .path.display())]
    DuplicateAssignment {
        path: PathBuf,
        first: String,
        second: String,
    },

    /// A runtime-only bundle ended up with graph members.
    #[error("runtime bundle '{bundle}' contains {count} module(s)")]
    RuntimeBundleNotEmpty { bundle: String, count: usize },
}

impl Error {
    /// Error family for reporting.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transform { .. } => ErrorCategory::Transform,
            Error::IncompletePartition { .. }
            | Error::DuplicateAssignment { .. }
            | Error::RuntimeBundleNotEmpty { .. } => ErrorCategory::PartitionInvariant,
            _ => ErrorCategory::Configuration,
        }
    }

    /// Module path the error is about, when there is one.
    pub fn module_path(&self) -> Option<&std::path::Path> {
        match self {
            Error::UnclassifiedModule { path, .. }
            | Error::AmbiguousPartition { path, .. }
            | Error::Transform { path, .. }
            | Error::IncompletePartition { path }
            | Error::DuplicateAssignment { path, .. }
            | Error::UnknownEntry { path, .. } => Some(path),
            Error::DuplicateModule(path) | Error::UnreachableModule(path) => Some(path),
            Error::UnknownImport { from, .. } => Some(from),
            _ => None,
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::UnclassifiedModule { .. } => "KILN::UNCLASSIFIED_MODULE",
            Error::AmbiguousPartition { .. } => "KILN::AMBIGUOUS_PARTITION",
            Error::ReservedBundleName { .. } => "KILN::RESERVED_BUNDLE_NAME",
            Error::InvalidRule { .. } => "KILN::INVALID_RULE",
            Error::InvalidTemplate { .. } => "KILN::INVALID_TEMPLATE",
            Error::DuplicateModule(_) => "KILN::DUPLICATE_MODULE",
            Error::UnknownEntry { .. } => "KILN::UNKNOWN_ENTRY",
            Error::UnknownImport { .. } => "KILN::UNKNOWN_IMPORT",
            Error::UnreachableModule(_) => "KILN::UNREACHABLE_MODULE",
            Error::NoEntries => "KILN::NO_ENTRIES",
            Error::InvalidManifest(_) => "KILN::INVALID_MANIFEST",
            Error::Transform { .. } => "KILN::TRANSFORM",
            Error::IncompletePartition { .. } => "KILN::INCOMPLETE_PARTITION",
            Error::DuplicateAssignment { .. } => "KILN::DUPLICATE_ASSIGNMENT",
            Error::RuntimeBundleNotEmpty { .. } => "KILN::RUNTIME_BUNDLE_NOT_EMPTY",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::UnclassifiedModule { path, .. } => Some(Box::new(format!(
                "Add a [[rules]] entry whose extensions cover '{}'.",
                path.extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ))),
            Error::AmbiguousPartition { .. } => Some(Box::new(
                "Give one of the matching partition groups a higher priority.",
            )),
            Error::ReservedBundleName { .. } => Some(Box::new(
                "Bundle names of the form 'runtime~<entry>' are reserved for runtime bundles.",
            )),
            Error::UnreachableModule(_) => Some(Box::new(
                "Remove the module from the graph manifest or import it from an entry.",
            )),
            Error::IncompletePartition { .. }
            | Error::DuplicateAssignment { .. }
            | Error::RuntimeBundleNotEmpty { .. } => Some(Box::new(
                "This is a bug in the partition planner, please report it.",
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_error_family() {
        let unclassified = Error::UnclassifiedModule {
            path: PathBuf::from("/app/src/data.bin"),
            kind: "other-binary".into(),
        };
        assert_eq!(unclassified.category(), ErrorCategory::Configuration);

        let transform = Error::Transform {
            path: PathBuf::from("/app/src/App.tsx"),
            stage: "typescript".into(),
            message: "unexpected token".into(),
        };
        assert_eq!(transform.category(), ErrorCategory::Transform);

        let incomplete = Error::IncompletePartition {
            path: PathBuf::from("/app/src/App.tsx"),
        };
        assert_eq!(incomplete.category(), ErrorCategory::PartitionInvariant);
    }

    #[test]
    fn ambiguous_partition_message_names_both_rules() {
        let err = Error::AmbiguousPartition {
            path: PathBuf::from("/app/node_modules/react/index.js"),
            priority: 40,
            first_rule: 0,
            first_bundle: "chunk-react".into(),
            second_rule: 2,
            second_bundle: "chunk-ui".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("#0 (chunk-react)"));
        assert!(msg.contains("#2 (chunk-ui)"));
        assert!(msg.contains("priority 40"));
        assert_eq!(
            err.module_path(),
            Some(std::path::Path::new("/app/node_modules/react/index.js"))
        );
    }
}
