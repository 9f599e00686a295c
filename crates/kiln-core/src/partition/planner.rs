use rustc_hash::FxHashMap;
use tracing::debug;

use super::rule::{PartitionRule, PartitionRules, runtime_bundle_name};
use super::{BundleDescriptor, BundleKind, PartitionMap};
use crate::error::{Error, Result};
use crate::graph::ModuleGraph;
use crate::mode::{FilenameKind, ModeSettings};
use crate::module::{Module, ModuleId};

/// Assign every module of `graph` to exactly one bundle.
///
/// Entry modules always stay in their own entry bundle. Any other module
/// goes to the bundle of the highest-priority matching rule; two matching
/// rules sharing the top priority is an error even when they name the same
/// bundle. Unmatched modules fall back to the bundle of the entry that owns
/// them.
pub fn plan(graph: &ModuleGraph, rules: &PartitionRules, settings: &ModeSettings) -> Result<PartitionMap> {
    let entry_names: Vec<&str> = graph.entries().iter().map(|e| e.name.as_str()).collect();
    let mut members: FxHashMap<&str, Vec<ModuleId>> = FxHashMap::default();

    for module in graph.modules() {
        let bundle = match own_entry(graph, module.id) {
            Some(entry) => entry,
            None => match select_rule(module, rules.rules())? {
                Some(rule) => {
                    debug!(
                        module = %module.path.display(),
                        group = %rule.key,
                        bundle = %rule.bundle,
                        priority = rule.priority,
                        "partition rule matched"
                    );
                    rule.bundle.as_str()
                }
                None => graph.owner(module.id).name.as_str(),
            },
        };
        members.entry(bundle).or_default().push(module.id);
    }

    let entry_template = settings.filename_template(FilenameKind::EntryScript);
    let chunk_template = settings.filename_template(FilenameKind::ChunkScript);
    let mut bundles = Vec::new();

    if rules.runtime_bundle() {
        for entry in &entry_names {
            bundles.push(BundleDescriptor {
                name: runtime_bundle_name(entry),
                kind: BundleKind::Runtime,
                entry: Some((*entry).to_string()),
                members: Vec::new(),
                filename_template: entry_template.clone(),
                style_template: None,
                source_map: false,
                is_runtime_only: true,
            });
        }
    }

    for rule in rules.rules() {
        let name = rule.bundle.as_str();
        if entry_names.contains(&name) || bundles.iter().any(|b: &BundleDescriptor| b.name == name) {
            continue;
        }
        let Some(ids) = members.remove(name) else {
            continue;
        };
        bundles.push(BundleDescriptor {
            name: name.to_string(),
            kind: BundleKind::Split,
            entry: None,
            members: ids,
            filename_template: chunk_template.clone(),
            style_template: None,
            source_map: false,
            is_runtime_only: false,
        });
    }

    for entry in &entry_names {
        if bundles.iter().any(|b| b.kind == BundleKind::Entry && b.name == *entry) {
            continue;
        }
        bundles.push(BundleDescriptor {
            name: (*entry).to_string(),
            kind: BundleKind::Entry,
            entry: Some((*entry).to_string()),
            members: members.remove(entry).unwrap_or_default(),
            filename_template: entry_template.clone(),
            style_template: None,
            source_map: false,
            is_runtime_only: false,
        });
    }

    debug!(bundles = bundles.len(), "partition planned");
    Ok(PartitionMap::from_bundles(bundles))
}

fn own_entry(graph: &ModuleGraph, id: ModuleId) -> Option<&str> {
    graph
        .entries()
        .iter()
        .find(|entry| entry.module == id)
        .map(|entry| entry.name.as_str())
}

fn select_rule<'r>(module: &Module, rules: &'r [PartitionRule]) -> Result<Option<&'r PartitionRule>> {
    let mut best: Option<(usize, &PartitionRule)> = None;
    let mut tied: Option<(usize, &PartitionRule)> = None;

    for (idx, rule) in rules.iter().enumerate() {
        if !rule.test.matches(module) {
            continue;
        }
        match best {
            Some((_, current)) if rule.priority < current.priority => {}
            Some((_, current)) if rule.priority == current.priority => {
                if tied.is_none() {
                    tied = Some((idx, rule));
                }
            }
            _ => {
                best = Some((idx, rule));
                tied = None;
            }
        }
    }

    match (best, tied) {
        (Some((first_idx, first)), Some((second_idx, second))) => Err(Error::AmbiguousPartition {
            path: module.path.clone(),
            priority: first.priority,
            first_rule: first_idx,
            first_bundle: first.bundle.clone(),
            second_rule: second_idx,
            second_bundle: second.bundle.clone(),
        }),
        (best, _) => Ok(best.map(|(_, rule)| rule)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::partition::PartitionTest;

    fn graph() -> ModuleGraph {
        ModuleGraph::builder("/app")
            .module("src/main.js", None, 10)
            .module("src/App.jsx", None, 10)
            .module("node_modules/react/index.js", None, 10)
            .module("node_modules/lodash/map.js", None, 10)
            .entry("main", "src/main.js")
            .import("src/main.js", "src/App.jsx")
            .import("src/App.jsx", "node_modules/react/index.js")
            .import("src/App.jsx", "node_modules/lodash/map.js")
            .build()
            .unwrap()
    }

    fn settings() -> ModeSettings {
        ModeSettings::resolve(Mode::Production)
    }

    fn members(map: &PartitionMap, name: &str) -> Vec<String> {
        let g = graph();
        map.get(name)
            .unwrap()
            .members
            .iter()
            .map(|id| g.display_path(*id))
            .collect()
    }

    #[test]
    fn default_groups() {
        let map = plan(&graph(), &PartitionRules::defaults().unwrap(), &settings()).unwrap();
        let names: Vec<&str> = map.names().collect();
        assert_eq!(names, vec!["runtime~main", "chunk-react", "chunk-libs", "main"]);

        assert_eq!(members(&map, "chunk-react"), vec!["node_modules/react/index.js"]);
        assert_eq!(members(&map, "chunk-libs"), vec!["node_modules/lodash/map.js"]);
        assert_eq!(members(&map, "main"), vec!["src/main.js", "src/App.jsx"]);

        let runtime = map.get("runtime~main").unwrap();
        assert!(runtime.is_runtime_only);
        assert!(runtime.members.is_empty());
    }

    #[test]
    fn equal_priority_is_ambiguous() {
        let rules = PartitionRules::new(
            vec![
                PartitionRule::new("vendors", PartitionTest::Dependencies, "vendors", 10),
                PartitionRule::new("lodash", PartitionTest::Packages(vec!["lodash".into()]), "lodash", 10),
            ],
            true,
        )
        .unwrap();

        let err = plan(&graph(), &rules, &settings()).unwrap_err();
        match err {
            Error::AmbiguousPartition {
                path,
                first_rule,
                second_rule,
                priority,
                ..
            } => {
                assert!(path.ends_with("lodash/map.js"));
                assert_eq!((first_rule, second_rule, priority), (0, 1, 10));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn higher_priority_after_tie_clears_it() {
        let rules = PartitionRules::new(
            vec![
                PartitionRule::new("a", PartitionTest::Dependencies, "a", 10),
                PartitionRule::new("b", PartitionTest::Dependencies, "b", 10),
                PartitionRule::new("c", PartitionTest::Dependencies, "c", 30),
            ],
            false,
        )
        .unwrap();
        let map = plan(&graph(), &rules, &settings()).unwrap();
        assert_eq!(members(&map, "c").len(), 2);
        assert!(map.get("a").is_none());
    }

    #[test]
    fn entry_modules_are_never_split() {
        let rules = PartitionRules::new(
            vec![PartitionRule::new("app", PartitionTest::Application, "app", 50)],
            false,
        )
        .unwrap();
        let map = plan(&graph(), &rules, &settings()).unwrap();
        assert_eq!(members(&map, "app"), vec!["src/App.jsx"]);
        assert!(members(&map, "main").contains(&"src/main.js".to_string()));
    }

    #[test]
    fn rule_targeting_entry_name_merges_into_entry() {
        let rules = PartitionRules::new(
            vec![PartitionRule::new("deps", PartitionTest::Dependencies, "main", 5)],
            false,
        )
        .unwrap();
        let map = plan(&graph(), &rules, &settings()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("main").unwrap().members.len(), 4);
        assert_eq!(map.get("main").unwrap().kind, BundleKind::Entry);
    }

    #[test]
    fn split_templates_use_chunk_names() {
        let map = plan(&graph(), &PartitionRules::defaults().unwrap(), &settings()).unwrap();
        assert_eq!(
            map.get("chunk-libs").unwrap().filename_template.as_str(),
            "static/js/[name].[contenthash:10].chunk.js"
        );
        assert_eq!(
            map.get("main").unwrap().filename_template.as_str(),
            "static/js/[name].[contenthash:10].js"
        );
    }
}
