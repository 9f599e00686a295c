//! Kiln CLI: the binary side of kiln.
//!
//! `kiln-core` decides what a build looks like; this crate does the I/O
//! around it.
//!
//! - [`config`] loads the project, its configuration and the module graph
//! - [`render`] turns an emission plan into output files in memory
//! - [`output`] writes them atomically and copies the static directory
//! - [`dev`] serves builds from memory with live reload
//! - [`commands`] wires these into `kiln build` and `kiln serve`
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::cli::ProjectArgs;
//! use kiln_cli::commands::pipeline;
//! use kiln_cli::config::Project;
//! use kiln_core::Mode;
//!
//! fn main() -> kiln_cli::Result<()> {
//!     let project = Project::load(&ProjectArgs::default(), Mode::Production)?;
//!     let (planned, rendered) = pipeline::plan_and_render(&project)?;
//!     println!("{} bundles, {} files", planned.plan.bundles.len(), rendered.files.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod output;
pub mod render;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
