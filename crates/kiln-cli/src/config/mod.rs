//! Project loading: root, mode, configuration and module graph.
//!
//! Everything here happens once per command (and once per rebuild for the
//! module graph). The mode is decided before the configuration is loaded so
//! the matching profile can be applied.

mod conversions;

use std::fs;
use std::path::{Path, PathBuf};

use kiln_config::{ConfigDiscovery, KilnConfig, validate_fs};
use kiln_core::{EmitOptions, GraphManifest, Mode, ModeSettings, ModuleGraph, PartitionRules, RuleSet};
use path_clean::PathClean;
use tracing::debug;

use crate::cli::{ModeArg, ProjectArgs};
use crate::error::{CliError, Result, ResultExt};

pub use conversions::{partition_rules, rule_set};

/// Pick the build mode.
///
/// The `--mode` flag wins, then `NODE_ENV`, then the command's default.
///
/// ```
/// use kiln_cli::config::resolve_mode;
/// use kiln_core::Mode;
///
/// assert_eq!(resolve_mode(None, Some("production"), Mode::Development), Mode::Production);
/// assert_eq!(resolve_mode(None, Some("test"), Mode::Production), Mode::Development);
/// assert_eq!(resolve_mode(None, None, Mode::Production), Mode::Production);
/// ```
pub fn resolve_mode(flag: Option<ModeArg>, node_env: Option<&str>, default: Mode) -> Mode {
    flag.map(Mode::from)
        .or_else(|| Mode::from_node_env(node_env))
        .unwrap_or(default)
}

/// A loaded project. Immutable for the lifetime of a command.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub mode: Mode,
    /// Configuration with the mode's profile applied.
    pub config: KilnConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
}

impl Project {
    /// Load configuration for `mode` from the project root.
    pub fn load(args: &ProjectArgs, mode: Mode) -> Result<Self> {
        let root = resolve_root(args.cwd.as_deref())?;
        let discovery = ConfigDiscovery::new(&root);

        let (config, config_path) = match &args.config {
            Some(path) => {
                let path = absolutize(path, &root);
                if !path.is_file() {
                    return Err(CliError::FileNotFound(path));
                }
                (discovery.load_from(&path)?, Some(path))
            }
            None => match discovery.find() {
                Some(path) => (discovery.load_from(&path)?, Some(path)),
                None => (KilnConfig::default(), None),
            },
        };
        let config = config.materialize_profile(Some(mode.as_str()))?;

        debug!(
            root = %root.display(),
            mode = %mode,
            config = ?config_path,
            "project loaded"
        );

        Ok(Self {
            root,
            mode,
            config,
            config_path,
        })
    }

    /// Check entries and the graph manifest exist.
    pub fn validate(&self) -> Result<()> {
        validate_fs(&self.config, &self.root)?;
        Ok(())
    }

    pub fn settings(&self) -> ModeSettings {
        ModeSettings::resolve(self.mode)
    }

    pub fn source_dir(&self) -> PathBuf {
        absolutize(&self.config.project.source_dir, &self.root)
    }

    pub fn static_dir(&self) -> PathBuf {
        absolutize(&self.config.project.static_dir, &self.root)
    }

    pub fn html_template(&self) -> PathBuf {
        absolutize(&self.config.project.html_template, &self.root)
    }

    pub fn output_dir(&self) -> PathBuf {
        absolutize(&self.config.project.output_dir, &self.root)
    }

    pub fn graph_path(&self) -> PathBuf {
        absolutize(&self.config.project.graph, &self.root)
    }

    /// Files and directories a build reads and must never overwrite.
    pub fn input_paths(&self) -> Vec<PathBuf> {
        let mut inputs = vec![
            self.source_dir(),
            self.static_dir(),
            self.html_template(),
            self.graph_path(),
        ];
        inputs.extend(
            self.config
                .project
                .effective_entries()
                .values()
                .map(|path| absolutize(path, &self.root)),
        );
        inputs.extend(self.config_path.clone());
        inputs
    }

    pub fn rule_set(&self, settings: &ModeSettings) -> Result<RuleSet> {
        Ok(rule_set(&self.config, settings, &self.source_dir())?)
    }

    pub fn partition_rules(&self) -> Result<PartitionRules> {
        Ok(partition_rules(&self.config)?)
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            inline_threshold: self.config.assets.inline_threshold,
            static_dir: Some(self.static_dir()),
            html_template_name: self
                .config
                .project
                .html_template
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }

    /// Read the graph manifest and build the module graph.
    ///
    /// Modules listed without a size are measured on disk.
    pub fn load_graph(&self) -> Result<ModuleGraph> {
        let path = self.graph_path();
        let source = fs::read_to_string(&path).with_path(&path)?;
        let mut manifest = GraphManifest::from_json(&source)?;

        for module in manifest.modules.iter_mut().filter(|m| m.size == 0) {
            if let Ok(meta) = fs::metadata(absolutize(&module.path, &self.root)) {
                module.size = meta.len();
            }
        }

        let entries = self.config.project.effective_entries();
        Ok(manifest.into_graph(&self.root, &entries)?)
    }
}

fn resolve_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    let root = match cwd {
        Some(dir) => absolutize(dir, &current),
        None => current,
    };
    if !root.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "project root is not a directory: {}",
            root.display()
        )));
    }
    Ok(root)
}

/// Join a relative path onto `base` and normalize it.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.clean()
    } else {
        base.join(path).clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(root: &Path) -> ProjectArgs {
        ProjectArgs {
            mode: None,
            cwd: Some(root.to_path_buf()),
            config: None,
        }
    }

    #[test]
    fn flag_beats_node_env() {
        assert_eq!(
            resolve_mode(Some(ModeArg::Development), Some("production"), Mode::Production),
            Mode::Development
        );
    }

    #[test]
    fn profile_follows_mode() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("kiln.toml"),
            "[assets]\ninline_threshold = 100\n[profiles.production.assets]\ninline_threshold = 0\n",
        )
        .unwrap();

        let prod = Project::load(&args(dir.path()), Mode::Production).unwrap();
        assert_eq!(prod.config.assets.inline_threshold, 0);
        assert_eq!(prod.emit_options().inline_threshold, 0);

        let dev = Project::load(&args(dir.path()), Mode::Development).unwrap();
        assert_eq!(dev.config.assets.inline_threshold, 100);
    }

    #[test]
    fn paths_resolve_against_root() {
        let dir = TempDir::new().unwrap();
        let project = Project::load(&args(dir.path()), Mode::Production).unwrap();
        assert!(project.config_path.is_none());
        assert_eq!(project.output_dir(), dir.path().join("dist"));
        assert_eq!(project.graph_path(), dir.path().join("kiln-graph.json"));
        assert_eq!(project.emit_options().html_template_name.as_deref(), Some("index.html"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut a = args(dir.path());
        a.config = Some(PathBuf::from("other.toml"));
        assert!(matches!(
            Project::load(&a, Mode::Production),
            Err(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn graph_sizes_are_measured() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.js"), "console.log(1);").unwrap();
        fs::write(
            dir.path().join("kiln-graph.json"),
            r#"{ "modules": [ { "path": "src/main.js" } ] }"#,
        )
        .unwrap();

        let project = Project::load(&args(dir.path()), Mode::Development).unwrap();
        let graph = project.load_graph().unwrap();
        assert_eq!(graph.modules()[0].size, 15);
    }
}
