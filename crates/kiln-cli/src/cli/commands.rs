use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use kiln_core::Mode;

/// Available kiln subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the application into the output directory
    ///
    /// Classifies every module, partitions the graph into bundles and writes
    /// the bundles, assets, source maps and HTML page. Exits non-zero on any
    /// fatal configuration, transform or partition error; nothing is written
    /// in that case.
    Build(BuildArgs),

    /// Start the development server with live reload
    ///
    /// Keeps the build in memory, serves it over HTTP and rebuilds when
    /// source files change.
    Serve(ServeArgs),
}

/// Build mode selected on the command line.
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum ModeArg {
    /// Stable file names, inline styles, cheap source maps, hot reload
    #[value(name = "development", alias = "dev")]
    Development,

    /// Content-hashed file names, extracted styles, minification
    #[value(name = "production", alias = "prod")]
    Production,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Development => Mode::Development,
            ModeArg::Production => Mode::Production,
        }
    }
}

/// Options shared by every command that loads a project.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Build mode
    ///
    /// Overrides NODE_ENV. When neither is given, `build` uses production and
    /// `serve` uses development.
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<ModeArg>,

    /// Project root
    ///
    /// Relative paths in the configuration are resolved against this
    /// directory. Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Configuration file (kiln.toml or package.json)
    ///
    /// Defaults to kiln.toml in the project root, then the "kiln" field of
    /// package.json, then built-in defaults.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the build command
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Output directory, overriding [project].output_dir
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Print the emission plan as JSON instead of writing files
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the serve command
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Port to listen on, overriding [dev].port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Host to bind, overriding [dev].host
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Open the browser once the server is listening
    #[arg(long, conflicts_with = "no_open")]
    pub open: bool,

    /// Never open the browser
    #[arg(long)]
    pub no_open: bool,
}

impl ServeArgs {
    /// `--open` / `--no-open`, or `None` to defer to the configuration.
    pub fn open_override(&self) -> Option<bool> {
        match (self.open, self.no_open) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
