//! File system watcher with debouncing.
//!
//! Watches the project root recursively and drops changes under
//! `node_modules`, the output directory, hidden paths and any configured
//! ignore fragments.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// What the watcher skips.
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    /// Absolute directories whose contents never trigger a rebuild.
    ignored_dirs: Vec<PathBuf>,
    /// Path fragments matched against the root-relative path.
    patterns: Vec<String>,
}

impl WatchFilter {
    pub fn new(root: PathBuf, ignored_dirs: Vec<PathBuf>, patterns: Vec<String>) -> Self {
        Self {
            root,
            ignored_dirs,
            patterns,
        }
    }

    pub fn should_ignore(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return true;
        };
        if self.ignored_dirs.iter().any(|dir| path.starts_with(dir)) {
            return true;
        }

        let mut hidden = false;
        let mut in_node_modules = false;
        for component in relative.components() {
            let name = component.as_os_str().to_string_lossy();
            hidden |= name.starts_with('.') && name != "." && name != "..";
            in_node_modules |= name == "node_modules";
        }
        if hidden || in_node_modules {
            return true;
        }

        let relative = relative.to_string_lossy().replace('\\', "/");
        self.patterns.iter().any(|pattern| match pattern.strip_prefix('*') {
            Some(suffix) => relative.ends_with(suffix),
            None if pattern.contains('/') => relative.starts_with(pattern.as_str()),
            None => relative.split('/').any(|segment| segment == pattern),
        })
    }
}

/// Recursive watcher feeding [`FileChange`]s into a channel.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `filter`'s root.
    ///
    /// Repeated events for the same path within `debounce_ms` are dropped.
    pub fn new(filter: WatchFilter, debounce_ms: u64) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        let root = filter.root.clone();
        if !root.is_dir() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(100);
        let debounce = Duration::from_millis(debounce_ms);
        let mut last_event: Option<(PathBuf, Instant)> = None;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            for path in &event.paths {
                if filter.should_ignore(path) {
                    continue;
                }

                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                let change = match event.kind {
                    EventKind::Create(_) => FileChange::Created(path.clone()),
                    EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };
                trace!(?change, "file change");
                let _ = tx.blocking_send(change);
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((Self { _watcher: watcher, root }, rx))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
