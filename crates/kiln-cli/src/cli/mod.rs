//! Command-line interface definition for kiln.
//!
//! # Command Structure
//!
//! - `kiln build` - Plan and write a deployable artifact set
//! - `kiln serve` - Development server with live reload

mod commands;

use clap::Parser;

pub use commands::{BuildArgs, Command, ModeArg, ProjectArgs, ServeArgs};

/// Kiln - build configuration for front-end applications
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Build and serve front-end applications from a module graph",
    long_about = "Kiln classifies every module of a front-end application into a transform\n\
                  pipeline, partitions the graph into bundles and writes the result.\n\
                  Development and production builds differ only through the mode."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows every classification and partition decision.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
