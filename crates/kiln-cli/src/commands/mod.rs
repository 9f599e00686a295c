//! Command implementations for the kiln CLI.
//!
//! - [`build`] plans, renders and writes a build
//! - [`serve`] runs the development server with live reload
//!
//! Both share the planning and rendering steps in [`pipeline`].

pub mod build;
pub mod pipeline;
pub mod serve;

pub use build::execute as build_execute;
pub use serve::execute as serve_execute;
