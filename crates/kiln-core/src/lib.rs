//! Kiln core: turns a front-end module graph into an emission plan.
//!
//! The pipeline is leaf-first:
//!
//! 1. [`RuleSet::classify`] picks a transform [`Pipeline`] per module,
//! 2. [`ModeSettings::resolve`] fixes everything that differs between
//!    development and production,
//! 3. [`partition::plan`] assigns modules to bundles,
//! 4. [`emit::emit`] joins the three into an [`EmissionPlan`].
//!
//! [`Build`] runs all four for one build. The core does no I/O; reading
//! sources and writing files is the host's job.
//!
//! ```
//! use kiln_core::{Build, Mode, ModeSettings, ModuleGraph, PartitionRules, RuleSet};
//!
//! let graph = ModuleGraph::builder("/app")
//!     .module("src/main.js", None, 120)
//!     .entry("main", "src/main.js")
//!     .build()?;
//! let settings = ModeSettings::resolve(Mode::Production);
//! let rules = RuleSet::defaults(&settings, std::path::Path::new("/app/src"))?;
//! let partition = PartitionRules::defaults()?;
//!
//! let plan = Build::new(&graph, &settings, &rules, &partition).run()?;
//! assert_eq!(plan.bundles.len(), 2);
//! # Ok::<(), kiln_core::Error>(())
//! ```

pub mod emit;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod mode;
pub mod module;
pub mod partition;
pub mod pipeline;
pub mod rules;
pub mod template;
pub mod transform;

pub use emit::{AssetDescriptor, AssetDisposition, EmissionPlan, EmitOptions, Minimizer, PlannedModule};
pub use error::{Error, ErrorCategory, Result};
pub use graph::{Entry, ModuleGraph};
pub use manifest::GraphManifest;
pub use mode::{FilenameKind, Mode, ModeSettings, SourceMapFidelity, StyleExtraction};
pub use module::{Module, ModuleId, ModuleKind, ModuleOrigin};
pub use partition::{BundleDescriptor, BundleKind, PartitionMap, PartitionRule, PartitionRules, PartitionTest};
pub use pipeline::Build;
pub use rules::{AssetPolicy, Classification, ModuleTest, Pipeline, PipelineOutput, RuleSet, StageId, TransformRule};
pub use template::{FilenameTemplate, TemplateContext};
pub use transform::{StageContext, StageError, StageRegistry, TransformStage};
