//! Transform rules and the rule matcher.
//!
//! A [`RuleSet`] is an ordered list of (predicate, pipeline) pairs. The first
//! rule whose predicate matches a module decides its pipeline; a module that
//! matches nothing is a configuration error.

mod defaults;
mod predicate;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::ModuleGraph;
use crate::module::{Module, ModuleId};

pub use defaults::stages;
pub use predicate::ModuleTest;

/// Identifier of an external transform stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StageId(Cow<'static, str>);

impl StageId {
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an asset-producing pipeline disposes of its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetPolicy {
    /// Inline as a data URL when at or below the inline threshold.
    InlineBelowThreshold,
    /// Always emit a separate file.
    AlwaysEmit,
}

/// What a pipeline ultimately produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "policy")]
pub enum PipelineOutput {
    Script,
    Style,
    Asset(AssetPolicy),
}

/// Ordered stages applied to a module, first stage first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pipeline {
    pub name: String,
    pub stages: Vec<StageId>,
    pub output: PipelineOutput,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, stages: Vec<StageId>, output: PipelineOutput) -> Self {
        Self {
            name: name.into(),
            stages,
            output,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformRule {
    pub test: ModuleTest,
    pub pipeline: Arc<Pipeline>,
}

impl TransformRule {
    pub fn new(test: ModuleTest, pipeline: Pipeline) -> Self {
        Self {
            test,
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Result of classifying one module.
#[derive(Debug, Clone)]
pub struct Classification {
    pub module: ModuleId,
    /// Index of the winning rule in declaration order.
    pub rule_index: usize,
    pub pipeline: Arc<Pipeline>,
}

/// Ordered transform rules. Immutable once handed to a build.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<TransformRule>,
}

impl RuleSet {
    /// Build a rule set, rejecting predicates that can never match.
    pub fn new(rules: Vec<TransformRule>) -> Result<Self> {
        for (idx, rule) in rules.iter().enumerate() {
            if let Some(message) = rule.test.problem() {
                return Err(Error::InvalidRule {
                    rule: idx,
                    name: rule.pipeline.name.clone(),
                    message,
                });
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule, in declaration order, whose predicate accepts `module`.
    pub fn classify(&self, module: &Module) -> Result<Classification> {
        let (rule_index, rule) = self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.test.matches(module))
            .ok_or_else(|| Error::UnclassifiedModule {
                path: module.path.clone(),
                kind: module.kind.to_string(),
            })?;

        debug!(
            module = %module.path.display(),
            rule = rule_index,
            pipeline = %rule.pipeline.name,
            "classified module"
        );

        Ok(Classification {
            module: module.id,
            rule_index,
            pipeline: Arc::clone(&rule.pipeline),
        })
    }

    /// Classify every module of `graph` in parallel.
    ///
    /// Results are in graph order. When several modules fail, the error for
    /// the first one in graph order is returned.
    pub fn classify_all(&self, graph: &ModuleGraph) -> Result<Vec<Classification>> {
        let results: Vec<Result<Classification>> = graph
            .modules()
            .par_iter()
            .map(|module| self.classify(module))
            .collect();

        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleKind;

    fn rules() -> RuleSet {
        RuleSet::new(vec![
            TransformRule::new(
                ModuleTest::extensions(["tsx", "ts"]),
                Pipeline::new("typed-script", vec![stages::TYPESCRIPT], PipelineOutput::Script),
            ),
            TransformRule::new(
                ModuleTest::extensions(["jsx", "js"]),
                Pipeline::new("script", vec![stages::BABEL], PipelineOutput::Script),
            ),
            TransformRule::new(
                ModuleTest::extensions(["js"]),
                Pipeline::new("shadowed", vec![], PipelineOutput::Script),
            ),
        ])
        .unwrap()
    }

    fn graph(paths: &[&str]) -> ModuleGraph {
        let mut builder = ModuleGraph::builder("/app").entry("main", paths[0]);
        for path in paths {
            builder = builder.module(*path, None, 1);
        }
        for path in &paths[1..] {
            builder = builder.import(paths[0], *path);
        }
        builder.build().unwrap()
    }

    #[test]
    fn first_matching_rule_wins() {
        let graph = graph(&["src/main.js", "src/App.tsx"]);
        let classes = rules().classify_all(&graph).unwrap();

        assert_eq!(classes[0].rule_index, 1);
        assert_eq!(classes[0].pipeline.name, "script");
        assert_eq!(classes[1].rule_index, 0);
        assert_eq!(classes[1].pipeline.name, "typed-script");
    }

    #[test]
    fn unmatched_module_is_unclassified() {
        let graph = graph(&["src/main.js", "src/data.bin", "src/other.wasm"]);
        let err = rules().classify_all(&graph).unwrap_err();
        match err {
            Error::UnclassifiedModule { path, kind } => {
                assert!(path.ends_with("data.bin"));
                assert_eq!(kind, ModuleKind::OtherBinary.to_string());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn classification_is_deterministic() {
        let graph = graph(&["src/main.js", "src/App.tsx", "src/util.ts", "src/view.jsx"]);
        let rules = rules();
        let first: Vec<usize> = rules.classify_all(&graph).unwrap().iter().map(|c| c.rule_index).collect();
        for _ in 0..10 {
            let again: Vec<usize> = rules.classify_all(&graph).unwrap().iter().map(|c| c.rule_index).collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn rule_without_extensions_is_invalid() {
        let err = RuleSet::new(vec![TransformRule::new(
            ModuleTest::extensions(Vec::<&str>::new()),
            Pipeline::new("empty", vec![], PipelineOutput::Script),
        )])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRule { rule: 0, .. }));
    }
}
