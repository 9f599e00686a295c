use std::path::Path;

use super::{AssetPolicy, ModuleTest, Pipeline, PipelineOutput, RuleSet, StageId, TransformRule};
use crate::error::Result;
use crate::mode::{ModeSettings, StyleExtraction};

/// Stage identifiers understood by the built-in rule set.
pub mod stages {
    use super::StageId;

    pub const POSTCSS: StageId = StageId::from_static("postcss");
    pub const CSS: StageId = StageId::from_static("css");
    pub const LESS: StageId = StageId::from_static("less");
    pub const SASS: StageId = StageId::from_static("sass");
    pub const STYLUS: StageId = StageId::from_static("stylus");
    pub const STYLE_INJECT: StageId = StageId::from_static("style-inject");
    pub const STYLE_EXTRACT: StageId = StageId::from_static("style-extract");
    pub const BABEL: StageId = StageId::from_static("babel");
    pub const REACT_REFRESH: StageId = StageId::from_static("react-refresh");
    pub const TYPESCRIPT: StageId = StageId::from_static("typescript");
    pub const JSON: StageId = StageId::from_static("json");
}

impl RuleSet {
    /// Built-in rules for a React-style application rooted at `source_dir`.
    pub fn defaults(settings: &ModeSettings, source_dir: &Path) -> Result<Self> {
        let style_tail = match settings.style_extraction {
            StyleExtraction::Inline => stages::STYLE_INJECT,
            StyleExtraction::SeparateFile => stages::STYLE_EXTRACT,
        };
        let style = |name: &str, pre: Option<StageId>| {
            let mut chain: Vec<StageId> = pre.into_iter().collect();
            chain.extend([stages::POSTCSS, stages::CSS, style_tail.clone()]);
            Pipeline::new(name, chain, PipelineOutput::Style)
        };

        let mut script = vec![stages::BABEL];
        if settings.hot_reload_enabled {
            script.push(stages::REACT_REFRESH);
        }

        RuleSet::new(vec![
            TransformRule::new(ModuleTest::extensions(["css"]), style("css", None)),
            TransformRule::new(ModuleTest::extensions(["less"]), style("less", Some(stages::LESS))),
            TransformRule::new(
                ModuleTest::extensions(["sass", "scss"]),
                style("sass", Some(stages::SASS)),
            ),
            TransformRule::new(
                ModuleTest::extensions(["styl"]),
                style("stylus", Some(stages::STYLUS)),
            ),
            TransformRule::new(
                ModuleTest::extensions(["jpg", "jpeg", "png", "gif", "webp", "svg"]),
                Pipeline::new(
                    "images",
                    vec![],
                    PipelineOutput::Asset(AssetPolicy::InlineBelowThreshold),
                ),
            ),
            TransformRule::new(
                ModuleTest::extensions(["ttf", "woff", "woff2"]),
                Pipeline::new("fonts", vec![], PipelineOutput::Asset(AssetPolicy::AlwaysEmit)),
            ),
            TransformRule::new(
                ModuleTest::extensions(["js", "jsx"]).under(source_dir),
                Pipeline::new("script", script, PipelineOutput::Script),
            ),
            TransformRule::new(
                ModuleTest::extensions(["ts", "tsx"]).under(source_dir),
                Pipeline::new("typed-script", vec![stages::TYPESCRIPT], PipelineOutput::Script),
            ),
            TransformRule::new(
                ModuleTest::extensions(["js", "mjs", "cjs"]),
                Pipeline::new("vendor-script", vec![], PipelineOutput::Script),
            ),
            TransformRule::new(
                ModuleTest::extensions(["json"]),
                Pipeline::new("json", vec![stages::JSON], PipelineOutput::Script),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::mode::Mode;
    use crate::module::{Module, ModuleId, ModuleKind, ModuleOrigin};

    fn module(path: &str) -> Module {
        let path = PathBuf::from(path);
        Module {
            id: ModuleId(0),
            kind: ModuleKind::from_path(&path),
            origin: ModuleOrigin::from_path(&path),
            path,
            size: 0,
        }
    }

    fn pipeline_for(mode: Mode, path: &str) -> Pipeline {
        let rules = RuleSet::defaults(&ModeSettings::resolve(mode), Path::new("/app/src")).unwrap();
        (*rules.classify(&module(path)).unwrap().pipeline).clone()
    }

    #[test]
    fn style_tail_follows_extraction_mode() {
        let dev = pipeline_for(Mode::Development, "/app/src/index.scss");
        let prod = pipeline_for(Mode::Production, "/app/src/index.scss");
        assert_eq!(
            dev.stages,
            vec![stages::SASS, stages::POSTCSS, stages::CSS, stages::STYLE_INJECT]
        );
        assert_eq!(prod.stages.last(), Some(&stages::STYLE_EXTRACT));
    }

    #[test]
    fn react_refresh_only_with_hot_reload() {
        let dev = pipeline_for(Mode::Development, "/app/src/App.jsx");
        let prod = pipeline_for(Mode::Production, "/app/src/App.jsx");
        assert_eq!(dev.stages, vec![stages::BABEL, stages::REACT_REFRESH]);
        assert_eq!(prod.stages, vec![stages::BABEL]);
    }

    #[test]
    fn dependency_scripts_skip_source_transforms() {
        let p = pipeline_for(Mode::Production, "/app/node_modules/react/index.js");
        assert_eq!(p.name, "vendor-script");
        assert!(p.stages.is_empty());
    }

    #[test]
    fn typed_script_outside_source_dir_is_unclassified() {
        let rules = RuleSet::defaults(&ModeSettings::resolve(Mode::Production), Path::new("/app/src")).unwrap();
        assert!(rules.classify(&module("/app/node_modules/lib/index.ts")).is_err());
    }

    #[test]
    fn assets_have_distinct_policies() {
        let img = pipeline_for(Mode::Production, "/app/src/logo.svg");
        let font = pipeline_for(Mode::Production, "/app/src/inter.woff2");
        assert_eq!(img.output, PipelineOutput::Asset(AssetPolicy::InlineBelowThreshold));
        assert_eq!(font.output, PipelineOutput::Asset(AssetPolicy::AlwaysEmit));
    }
}
