//! Conversion from kiln-config types to the core's rule types.

use std::path::Path;

use kiln_config::{GroupConfig, KilnConfig, RuleConfig, RuleOutput};
use kiln_core::{
    AssetPolicy, Error as CoreError, ModeSettings, ModuleTest, PartitionRule, PartitionRules, PartitionTest,
    Pipeline, PipelineOutput, RuleSet, StageId, TransformRule,
};

/// User rules first, then the built-in rules when enabled.
pub fn rule_set(config: &KilnConfig, settings: &ModeSettings, source_dir: &Path) -> kiln_core::Result<RuleSet> {
    let mut rules: Vec<TransformRule> = config
        .rules
        .iter()
        .map(|rule| transform_rule(rule, source_dir))
        .collect();

    if config.builtin_rules {
        rules.extend(RuleSet::defaults(settings, source_dir)?.rules().iter().cloned());
    }

    RuleSet::new(rules)
}

fn transform_rule(rule: &RuleConfig, source_dir: &Path) -> TransformRule {
    let mut test = ModuleTest::extensions(&rule.extensions);
    if rule.source_only {
        test = test.under(source_dir);
    }
    let stages = rule.stages.iter().map(|s| StageId::new(s.as_str())).collect();
    TransformRule::new(test, Pipeline::new(rule.name.as_str(), stages, pipeline_output(rule.output)))
}

fn pipeline_output(output: RuleOutput) -> PipelineOutput {
    match output {
        RuleOutput::Script => PipelineOutput::Script,
        RuleOutput::Style => PipelineOutput::Style,
        RuleOutput::Asset => PipelineOutput::Asset(AssetPolicy::InlineBelowThreshold),
        RuleOutput::AssetResource => PipelineOutput::Asset(AssetPolicy::AlwaysEmit),
    }
}

/// Built-in groups first when enabled, then user groups in declaration order.
pub fn partition_rules(config: &KilnConfig) -> kiln_core::Result<PartitionRules> {
    let mut rules = if config.partition.builtin_groups {
        PartitionRules::defaults()?.rules().to_vec()
    } else {
        Vec::new()
    };

    let offset = rules.len();
    for (idx, group) in config.partition.groups.iter().enumerate() {
        rules.push(partition_rule(offset + idx, group)?);
    }

    PartitionRules::new(rules, config.partition.runtime_bundle)
}

fn partition_rule(index: usize, group: &GroupConfig) -> kiln_core::Result<PartitionRule> {
    let invalid = |message: String| CoreError::InvalidRule {
        rule: index,
        name: group.name.clone(),
        message,
    };

    let test = match (&group.pattern, group.packages.is_empty(), group.dependencies) {
        (Some(pattern), true, false) => PartitionTest::pattern(pattern).map_err(|e| invalid(e.to_string()))?,
        (None, false, false) => PartitionTest::Packages(group.packages.clone()),
        (None, true, true) => PartitionTest::Dependencies,
        _ => {
            return Err(invalid(
                "set exactly one of pattern, packages or dependencies".to_string(),
            ));
        }
    };

    Ok(PartitionRule::new(
        group.name.as_str(),
        test,
        group.bundle.as_str(),
        group.priority,
    ))
}
