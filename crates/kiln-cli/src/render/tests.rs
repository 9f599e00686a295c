use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use kiln_core::{Build, EmitOptions, Mode, ModeSettings, ModuleGraph, PartitionRules, RuleSet};
use pretty_assertions::assert_eq;

use super::*;
use crate::error::CliError;

fn sources() -> HashMap<PathBuf, Vec<u8>> {
    [
        ("/app/src/main.js", &b"require('./app.css');\nrequire('react');\n"[..]),
        ("/app/src/app.css", b"body { margin: 0; }\n"),
        ("/app/src/logo.png", b"\x89PNG"),
        ("/app/src/data.json", br#"{ "answer": 42 }"#),
        ("/app/node_modules/react/index.js", b"module.exports = {};\n"),
        ("/app/node_modules/lodash/index.js", b"module.exports = {};\n"),
    ]
    .into_iter()
    .map(|(p, b)| (PathBuf::from(p), b.to_vec()))
    .collect()
}

fn graph() -> ModuleGraph {
    ModuleGraph::builder("/app")
        .module("src/main.js", None, 40)
        .module("src/app.css", None, 20)
        .module("src/logo.png", None, 4)
        .module("src/data.json", None, 16)
        .module("node_modules/react/index.js", None, 21)
        .module("node_modules/lodash/index.js", None, 21)
        .import("src/main.js", "src/app.css")
        .import("src/main.js", "src/logo.png")
        .import("src/main.js", "src/data.json")
        .import("src/main.js", "node_modules/react/index.js")
        .import("src/main.js", "node_modules/lodash/index.js")
        .entry("main", "src/main.js")
        .build()
        .unwrap()
}

fn render_mode(mode: Mode, partition: PartitionRules) -> Result<RenderedBuild> {
    let graph = graph();
    let settings = ModeSettings::resolve(mode);
    let rules = RuleSet::defaults(&settings, Path::new("/app/src")).unwrap();
    let plan = Build::new(&graph, &settings, &rules, &partition)
        .with_options(EmitOptions::default())
        .run()
        .unwrap();
    let registry = builtin_registry();
    let files = sources();

    render(
        &RenderInput {
            plan: &plan,
            graph: &graph,
            settings: &settings,
            registry: &registry,
            html_template: None,
            public_path: "/",
        },
        |path: &Path| {
            files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        },
    )
}

fn text(build: &RenderedBuild, path: &str) -> String {
    String::from_utf8(build.get(path).unwrap().contents.clone()).unwrap()
}

fn find(build: &RenderedBuild, prefix: &str, suffix: &str) -> String {
    build
        .files
        .iter()
        .map(|f| f.path.clone())
        .find(|p| p.starts_with(prefix) && p.ends_with(suffix))
        .unwrap_or_else(|| panic!("no file {prefix}*{suffix}"))
}

#[test]
fn development_build_uses_plain_names() {
    let build = render_mode(Mode::Development, PartitionRules::defaults().unwrap()).unwrap();

    let main = text(&build, "static/js/main.js");
    assert!(main.contains(r#"__kiln__.define("./src/main.js""#));
    assert!(main.contains(r#"__kiln__.style("./src/app.css""#));
    assert!(main.contains("data:image/png;base64,"));
    assert!(main.contains(r#"module.exports = {"answer":42};"#));
    assert!(main.trim_end().ends_with("//# sourceMappingURL=main.js.map"));

    let runtime = text(&build, "static/js/runtime~main.js");
    assert!(runtime.contains("global.__kiln__ ="));
    assert!(runtime.contains("__kiln__.hot = true;"));

    // styles stay inside the script bundle in development
    assert!(build.files.iter().all(|f| !f.path.ends_with(".css")));
    assert!(build.get("static/js/chunk-react.chunk.js").is_some());
    assert!(build.get("static/js/chunk-libs.chunk.js").is_some());
}

#[test]
fn entry_bundle_runs_its_entry_last() {
    let build = render_mode(Mode::Development, PartitionRules::defaults().unwrap()).unwrap();
    let main = text(&build, "static/js/main.js");
    let run = main.find(r#"__kiln__.run("./src/main.js");"#).unwrap();
    let last_define = main.rfind("__kiln__.define(").unwrap();
    assert!(run > last_define);
}

#[test]
fn production_build_hashes_and_extracts_styles() {
    let build = render_mode(Mode::Production, PartitionRules::defaults().unwrap()).unwrap();

    let main_js = find(&build, "static/js/main.", ".js");
    let main_css = find(&build, "static/css/main.", ".css");
    assert!(build.get(&format!("{main_js}.map")).is_some());
    assert!(build.get(&format!("{main_css}.map")).is_some());

    let css = text(&build, &main_css);
    assert!(css.starts_with("/* ./src/app.css */\nbody { margin: 0; }\n"));
    assert!(css.trim_end().ends_with(".css.map */"));

    let map: serde_json::Value = serde_json::from_slice(&build.get(&format!("{main_js}.map")).unwrap().contents).unwrap();
    assert_eq!(map["sources"][0], "./src/main.js");
    assert_eq!(map["sourcesContent"][0], "require('./app.css');\nrequire('react');\n");
}

#[test]
fn page_lists_bundles_in_load_order() {
    let build = render_mode(Mode::Production, PartitionRules::defaults().unwrap()).unwrap();
    let html = text(&build, PAGE_NAME);

    let runtime = html.find("/static/js/runtime~main.").unwrap();
    let react = html.find("/static/js/chunk-react.").unwrap();
    let libs = html.find("/static/js/chunk-libs.").unwrap();
    let main = html.find("/static/js/main.").unwrap();
    assert!(runtime < react && react < libs && libs < main);
    assert!(html.find("/static/css/main.").unwrap() < html.find("</head>").unwrap());
}

#[test]
fn bundles_carry_the_bootstrap_without_a_runtime_bundle() {
    let partition = PartitionRules::new(Vec::new(), false).unwrap();
    let build = render_mode(Mode::Development, partition).unwrap();

    let main = text(&build, "static/js/main.js");
    assert!(main.starts_with("(function (global) {"));
    assert!(main.contains(r#"__kiln__.define("./node_modules/react/index.js""#));
}

#[test]
fn missing_source_aborts_render() {
    let graph = graph();
    let settings = ModeSettings::resolve(Mode::Development);
    let rules = RuleSet::defaults(&settings, Path::new("/app/src")).unwrap();
    let partition = PartitionRules::defaults().unwrap();
    let plan = Build::new(&graph, &settings, &rules, &partition).run().unwrap();
    let registry = builtin_registry();

    let err = render(
        &RenderInput {
            plan: &plan,
            graph: &graph,
            settings: &settings,
            registry: &registry,
            html_template: None,
            public_path: "/",
        },
        |_: &Path| Err(io::Error::new(io::ErrorKind::NotFound, "gone")),
    )
    .unwrap_err();
    assert!(matches!(err, CliError::FileNotFound(p) if p == Path::new("/app/src/main.js")));
}

#[test]
fn module_keys_are_root_relative() {
    assert_eq!(module_key(Path::new("/app"), Path::new("/app/src/a/b.js")), "./src/a/b.js");
    assert_eq!(module_key(Path::new("/app"), Path::new("/other/x.js")), "/other/x.js");
}
