//! One build, from module graph to emission plan.

use tracing::{info, info_span};

use crate::emit::{EmissionPlan, EmitOptions, emit};
use crate::error::Result;
use crate::graph::ModuleGraph;
use crate::mode::ModeSettings;
use crate::partition::{PartitionRules, plan};
use crate::rules::RuleSet;

/// Inputs of a single build. Nothing here is mutated while it runs.
#[derive(Debug, Clone)]
pub struct Build<'a> {
    pub graph: &'a ModuleGraph,
    pub settings: &'a ModeSettings,
    pub rules: &'a RuleSet,
    pub partition: &'a PartitionRules,
    pub options: EmitOptions,
}

impl<'a> Build<'a> {
    pub fn new(
        graph: &'a ModuleGraph,
        settings: &'a ModeSettings,
        rules: &'a RuleSet,
        partition: &'a PartitionRules,
    ) -> Self {
        Self {
            graph,
            settings,
            rules,
            partition,
            options: EmitOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EmitOptions) -> Self {
        self.options = options;
        self
    }

    /// Classify all modules in parallel, then plan and emit.
    ///
    /// Either returns a complete plan or the first fatal error; a partial
    /// plan never escapes.
    pub fn run(&self) -> Result<EmissionPlan> {
        let span = info_span!("build", mode = %self.settings.mode, modules = self.graph.len());
        let _guard = span.enter();

        let classifications = self.rules.classify_all(self.graph)?;
        let partition = plan(self.graph, self.partition, self.settings)?;
        let plan = emit(self.graph, &classifications, self.settings, partition, &self.options)?;

        info!(
            bundles = plan.bundles.len(),
            assets = plan.assets.len(),
            "emission plan ready"
        );
        Ok(plan)
    }
}
