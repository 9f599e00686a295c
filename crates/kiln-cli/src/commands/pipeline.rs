//! Planning and rendering shared by `build` and `serve`.

use std::fs;

use kiln_core::{Build, EmissionPlan, ModeSettings, ModuleGraph};
use tracing::debug;

use crate::config::Project;
use crate::error::{Result, ResultExt};
use crate::render::{self, RenderInput, RenderedBuild, builtin_registry};

/// Everything the core decided for one build.
#[derive(Debug, Clone)]
pub struct PlannedBuild {
    pub graph: ModuleGraph,
    pub settings: ModeSettings,
    pub plan: EmissionPlan,
}

/// Load the module graph and run the core over it.
pub fn plan(project: &Project) -> Result<PlannedBuild> {
    let graph = project.load_graph()?;
    let settings = project.settings();
    let rules = project.rule_set(&settings)?;
    let partition = project.partition_rules()?;

    let plan = Build::new(&graph, &settings, &rules, &partition)
        .with_options(project.emit_options())
        .run()?;

    Ok(PlannedBuild { graph, settings, plan })
}

/// Render a planned build with the built-in stages, reading sources from disk.
pub fn render(project: &Project, planned: &PlannedBuild) -> Result<RenderedBuild> {
    let template_path = project.html_template();
    let html_template = if template_path.is_file() {
        Some(fs::read_to_string(&template_path).with_path(&template_path)?)
    } else {
        debug!(path = %template_path.display(), "no HTML template, using the built-in page");
        None
    };

    let registry = builtin_registry();
    render::render(
        &RenderInput {
            plan: &planned.plan,
            graph: &planned.graph,
            settings: &planned.settings,
            registry: &registry,
            html_template,
            public_path: "/",
        },
        render::read_source,
    )
}

/// Plan and render in one go.
pub fn plan_and_render(project: &Project) -> Result<(PlannedBuild, RenderedBuild)> {
    let planned = plan(project)?;
    let rendered = render(project, &planned)?;
    Ok((planned, rendered))
}
