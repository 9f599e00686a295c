use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::descriptor::{
    AssetDescriptor, AssetDisposition, DEFAULT_INLINE_THRESHOLD, EmissionPlan, EmissionSettings, Minimizer,
    PlannedModule, StaticCopy,
};
use crate::error::{Error, Result};
use crate::graph::ModuleGraph;
use crate::mode::{FilenameKind, ModeSettings, StyleExtraction};
use crate::partition::{BundleDescriptor, BundleKind, PartitionMap};
use crate::rules::{AssetPolicy, Classification, PipelineOutput};

/// Inputs to [`emit`] that do not come from the mode.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub inline_threshold: u64,
    /// Static directory to copy into the output root.
    pub static_dir: Option<PathBuf>,
    /// File name of the HTML template, excluded from the static copy.
    pub html_template_name: Option<String>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            inline_threshold: DEFAULT_INLINE_THRESHOLD,
            static_dir: None,
            html_template_name: Some("index.html".to_string()),
        }
    }
}

/// Join classifications, settings and the partition into an [`EmissionPlan`].
///
/// Fails when any graph module is missing from every bundle, appears in two
/// bundles, or sits in a runtime-only bundle.
pub fn emit(
    graph: &ModuleGraph,
    classifications: &[Classification],
    settings: &ModeSettings,
    partition: PartitionMap,
    options: &EmitOptions,
) -> Result<EmissionPlan> {
    let owners = check_partition(graph, &partition)?;

    let mut by_module: Vec<Option<&Classification>> = vec![None; graph.len()];
    for class in classifications {
        if let Some(slot) = by_module.get_mut(class.module.index()) {
            *slot = Some(class);
        }
    }

    let mut modules = Vec::with_capacity(graph.len());
    let mut assets = Vec::new();

    for (module, (class, bundle)) in graph.modules().iter().zip(by_module.into_iter().zip(owners)) {
        let Some(class) = class else {
            return Err(Error::UnclassifiedModule {
                path: module.path.clone(),
                kind: module.kind.to_string(),
            });
        };

        if let PipelineOutput::Asset(policy) = class.pipeline.output {
            let disposition = match policy {
                AssetPolicy::InlineBelowThreshold if module.size <= options.inline_threshold => {
                    AssetDisposition::Inline
                }
                _ => AssetDisposition::Emit(settings.filename_template(FilenameKind::Asset).clone()),
            };
            debug!(module = %module.path.display(), ?disposition, "asset disposition");
            assets.push(AssetDescriptor {
                module: module.id,
                bundle: bundle.clone(),
                disposition,
            });
        }

        modules.push(PlannedModule {
            id: module.id,
            path: module.path.clone(),
            kind: module.kind,
            rule_index: class.rule_index,
            pipeline: Arc::clone(&class.pipeline),
            bundle,
        });
    }

    let source_map = settings.source_map.enabled();
    let bundles: Vec<BundleDescriptor> = partition
        .into_bundles()
        .into_iter()
        .map(|mut bundle| {
            let has_styles = bundle
                .members
                .iter()
                .any(|id| modules[id.index()].pipeline.output == PipelineOutput::Style);
            bundle.style_template = match (settings.style_extraction, bundle.kind) {
                (StyleExtraction::SeparateFile, BundleKind::Entry) if has_styles => {
                    Some(settings.filename_template(FilenameKind::EntryStyle).clone())
                }
                (StyleExtraction::SeparateFile, BundleKind::Split) if has_styles => {
                    Some(settings.filename_template(FilenameKind::ChunkStyle).clone())
                }
                _ => None,
            };
            bundle.source_map = source_map;
            bundle
        })
        .collect();

    let minimizers = if settings.minify_enabled {
        vec![Minimizer::Script, Minimizer::Style, Minimizer::Image]
    } else {
        Vec::new()
    };

    let static_copy = match (&options.static_dir, settings.copy_static) {
        (Some(dir), true) => Some(StaticCopy {
            from: dir.clone(),
            ignore: options
                .html_template_name
                .iter()
                .map(|name| format!("**/{name}"))
                .collect(),
            allow_missing: true,
        }),
        _ => None,
    };

    Ok(EmissionPlan {
        mode: settings.mode,
        bundles,
        modules,
        assets,
        settings: EmissionSettings {
            clean_before_write: settings.clean_output,
            asset_inline_threshold: options.inline_threshold,
            source_map: settings.source_map,
            style_extraction: settings.style_extraction,
            hot_reload: settings.hot_reload_enabled,
            minimizers,
        },
        static_copy,
    })
}

/// Completeness and disjointness. Returns the owning bundle per module.
fn check_partition(graph: &ModuleGraph, partition: &PartitionMap) -> Result<Vec<String>> {
    let mut owners: Vec<Option<&str>> = vec![None; graph.len()];

    for bundle in partition.iter() {
        if bundle.is_runtime_only && !bundle.members.is_empty() {
            return Err(Error::RuntimeBundleNotEmpty {
                bundle: bundle.name.clone(),
                count: bundle.members.len(),
            });
        }
        for id in &bundle.members {
            let slot = owners.get_mut(id.index()).ok_or_else(|| Error::IncompletePartition {
                path: PathBuf::from(format!("<module #{}>", id.0)),
            })?;
            if let Some(first) = slot {
                return Err(Error::DuplicateAssignment {
                    path: graph.module(*id).path.clone(),
                    first: first.to_string(),
                    second: bundle.name.clone(),
                });
            }
            *slot = Some(bundle.name.as_str());
        }
    }

    owners
        .into_iter()
        .enumerate()
        .map(|(idx, owner)| {
            owner.map(str::to_string).ok_or_else(|| Error::IncompletePartition {
                path: graph.modules()[idx].path.clone(),
            })
        })
        .collect()
}
