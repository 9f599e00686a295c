//! Transform stages are external collaborators.
//!
//! The core only knows stages by [`StageId`]. Hosts register implementations
//! in a [`StageRegistry`]; a stage with no registered implementation passes
//! its input through unchanged and is reported once with a warning.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{trace, warn};

use crate::emit::Minimizer;
use crate::error::{Error, Result};
use crate::mode::ModeSettings;
use crate::rules::{Pipeline, StageId};

/// Failure reported by a stage implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StageError(pub String);

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// What a stage knows about the module it is transforming.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub path: &'a Path,
    pub settings: &'a ModeSettings,
}

pub trait TransformStage: Send + Sync {
    fn apply(&self, ctx: &StageContext<'_>, source: Vec<u8>) -> std::result::Result<Vec<u8>, StageError>;
}

impl<F> TransformStage for F
where
    F: Fn(&StageContext<'_>, Vec<u8>) -> std::result::Result<Vec<u8>, StageError> + Send + Sync,
{
    fn apply(&self, ctx: &StageContext<'_>, source: Vec<u8>) -> std::result::Result<Vec<u8>, StageError> {
        self(ctx, source)
    }
}

#[derive(Default, Clone)]
pub struct StageRegistry {
    stages: FxHashMap<StageId, Arc<dyn TransformStage>>,
    minimizers: FxHashMap<Minimizer, Arc<dyn TransformStage>>,
    /// Stages already reported as missing.
    unregistered: Arc<Mutex<FxHashSet<StageId>>>,
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stages: Vec<&str> = self.stages.keys().map(StageId::as_str).collect();
        stages.sort_unstable();
        f.debug_struct("StageRegistry")
            .field("stages", &stages)
            .field("minimizers", &self.minimizers.len())
            .finish()
    }
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: StageId, stage: impl TransformStage + 'static) -> &mut Self {
        self.stages.insert(id, Arc::new(stage));
        self
    }

    pub fn register_minimizer(&mut self, kind: Minimizer, stage: impl TransformStage + 'static) -> &mut Self {
        self.minimizers.insert(kind, Arc::new(stage));
        self
    }

    pub fn is_registered(&self, id: &StageId) -> bool {
        self.stages.contains_key(id)
    }

    /// Run every stage of `pipeline` over `source`, first stage first.
    pub fn run(&self, pipeline: &Pipeline, ctx: &StageContext<'_>, source: Vec<u8>) -> Result<Vec<u8>> {
        let mut current = source;
        for stage in &pipeline.stages {
            match self.stages.get(stage) {
                Some(implementation) => {
                    trace!(stage = %stage, module = %ctx.path.display(), "running stage");
                    current = implementation
                        .apply(ctx, current)
                        .map_err(|e| Error::Transform {
                            path: ctx.path.to_path_buf(),
                            stage: stage.to_string(),
                            message: e.0,
                        })?;
                }
                None => self.report_unregistered(stage),
            }
        }
        Ok(current)
    }

    fn report_unregistered(&self, stage: &StageId) {
        if self.unregistered.lock().insert(stage.clone()) {
            warn!(stage = %stage, "no implementation registered, passing through");
        }
    }

    /// Run the minimizer for `kind`, if one is registered.
    pub fn minify(&self, kind: Minimizer, ctx: &StageContext<'_>, source: Vec<u8>) -> Result<Vec<u8>> {
        match self.minimizers.get(&kind) {
            Some(implementation) => implementation.apply(ctx, source).map_err(|e| Error::Transform {
                path: ctx.path.to_path_buf(),
                stage: format!("minify-{}", minimizer_name(kind)),
                message: e.0,
            }),
            None => Ok(source),
        }
    }
}

fn minimizer_name(kind: Minimizer) -> &'static str {
    match kind {
        Minimizer::Script => "script",
        Minimizer::Style => "style",
        Minimizer::Image => "image",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::rules::{PipelineOutput, stages};

    fn upper(_: &StageContext<'_>, source: Vec<u8>) -> std::result::Result<Vec<u8>, StageError> {
        Ok(source.to_ascii_uppercase())
    }

    fn append_marker(_: &StageContext<'_>, mut source: Vec<u8>) -> std::result::Result<Vec<u8>, StageError> {
        source.extend_from_slice(b";x");
        Ok(source)
    }

    fn reject(_: &StageContext<'_>, _: Vec<u8>) -> std::result::Result<Vec<u8>, StageError> {
        Err(StageError::new("unexpected token"))
    }

    #[test]
    fn stages_run_in_order_and_unknown_pass_through() {
        let mut registry = StageRegistry::new();
        registry
            .register(stages::CSS, upper)
            .register(stages::POSTCSS, append_marker);

        let pipeline = Pipeline::new(
            "css",
            vec![stages::POSTCSS, stages::CSS, stages::STYLE_EXTRACT],
            PipelineOutput::Style,
        );
        let settings = ModeSettings::resolve(Mode::Production);
        let ctx = StageContext {
            path: Path::new("/app/src/a.css"),
            settings: &settings,
        };

        let out = registry.run(&pipeline, &ctx, b"a{}".to_vec()).unwrap();
        assert_eq!(out, b"A{};X");
    }

    #[test]
    fn unregistered_stage_is_reported_once() {
        let registry = StageRegistry::new();
        let pipeline = Pipeline::new("script", vec![stages::BABEL, stages::BABEL], PipelineOutput::Script);
        let settings = ModeSettings::resolve(Mode::Development);
        let ctx = StageContext {
            path: Path::new("/app/src/index.js"),
            settings: &settings,
        };

        for _ in 0..3 {
            assert_eq!(registry.run(&pipeline, &ctx, b"run();".to_vec()).unwrap(), b"run();");
        }
        assert_eq!(registry.unregistered.lock().len(), 1);
        assert!(registry.unregistered.lock().contains(&stages::BABEL));
    }

    #[test]
    fn stage_failure_carries_module_and_stage() {
        let mut registry = StageRegistry::new();
        registry.register(stages::TYPESCRIPT, reject);

        let pipeline = Pipeline::new("typed-script", vec![stages::TYPESCRIPT], PipelineOutput::Script);
        let settings = ModeSettings::resolve(Mode::Development);
        let ctx = StageContext {
            path: Path::new("/app/src/App.tsx"),
            settings: &settings,
        };

        let err = registry.run(&pipeline, &ctx, Vec::new()).unwrap_err();
        match err {
            Error::Transform { path, stage, message } => {
                assert_eq!(path, Path::new("/app/src/App.tsx"));
                assert_eq!(stage, "typescript");
                assert_eq!(message, "unexpected token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_minimizer_is_identity() {
        let registry = StageRegistry::new();
        let settings = ModeSettings::resolve(Mode::Production);
        let ctx = StageContext {
            path: Path::new("/app/dist/main.js"),
            settings: &settings,
        };
        let out = registry.minify(Minimizer::Script, &ctx, b"let a = 1;".to_vec()).unwrap();
        assert_eq!(out, b"let a = 1;");
    }
}
