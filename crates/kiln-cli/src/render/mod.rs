//! Rendering an emission plan into output files.
//!
//! The plan says which module goes where and how files are named; this
//! module reads the sources, runs them through the stage registry and
//! assembles bundle bodies, stylesheets, assets, source maps and the HTML
//! page. Nothing is written here, so a failing transform leaves the output
//! directory untouched.

pub mod html;
pub mod media;
pub mod runtime;
pub mod sourcemap;
pub mod stages;

use std::path::{Path, PathBuf};

use kiln_core::{
    AssetDisposition, BundleDescriptor, BundleKind, EmissionPlan, Minimizer, ModeSettings, ModuleGraph, ModuleKind,
    PipelineOutput, StageContext, StageRegistry, StyleExtraction, TemplateContext,
};
use tracing::debug;

use crate::error::{CliError, Result, ResultExt};
use html::PageAssets;
use sourcemap::SourceMap;

pub use media::content_type;
pub use stages::builtin_registry;

/// Name of the generated HTML page.
pub const PAGE_NAME: &str = "index.html";

/// One file of the rendered output, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Forward-slash path relative to the output root.
    pub path: String,
    pub contents: Vec<u8>,
    /// Bundle the file was produced for.
    pub bundle: Option<String>,
}

/// Everything a build produces, in write order.
#[derive(Debug, Clone, Default)]
pub struct RenderedBuild {
    pub files: Vec<OutputFile>,
}

impl RenderedBuild {
    pub fn get(&self, path: &str) -> Option<&OutputFile> {
        let path = path.trim_start_matches('/');
        self.files.iter().find(|f| f.path == path)
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.contents.len() as u64).sum()
    }

    fn push(&mut self, file: OutputFile) {
        if !self.files.iter().any(|f| f.path == file.path) {
            self.files.push(file);
        }
    }
}

/// Inputs to [`render`].
pub struct RenderInput<'a> {
    pub plan: &'a EmissionPlan,
    pub graph: &'a ModuleGraph,
    pub settings: &'a ModeSettings,
    pub registry: &'a StageRegistry,
    /// Contents of the HTML template, or `None` for the built-in page.
    pub html_template: Option<String>,
    /// URL prefix of the output root.
    pub public_path: &'a str,
}

/// Output URLs of one bundle.
#[derive(Debug, Clone, Default)]
struct BundleUrls {
    script: Option<String>,
    style: Option<String>,
}

/// Render `input.plan`, reading module sources through `read`.
pub fn render<F>(input: &RenderInput<'_>, read: F) -> Result<RenderedBuild>
where
    F: Fn(&Path) -> std::io::Result<Vec<u8>>,
{
    let plan = input.plan;
    let mut originals = Vec::with_capacity(plan.modules.len());
    let mut transformed = Vec::with_capacity(plan.modules.len());

    for module in &plan.modules {
        let source = read(&module.path).with_path(&module.path)?;
        let ctx = StageContext {
            path: &module.path,
            settings: input.settings,
        };
        let output = input.registry.run(&module.pipeline, &ctx, source.clone())?;
        originals.push(source);
        transformed.push(output);
    }

    let mut build = RenderedBuild::default();
    let urls = render_assets(input, &transformed, &mut build)?;

    let needs_bootstrap = !plan.bundles.iter().any(|b| b.is_runtime_only);
    let mut bundle_urls = Vec::with_capacity(plan.bundles.len());
    for bundle in &plan.bundles {
        let rendered = render_bundle(input, bundle, &originals, &transformed, &urls, needs_bootstrap, &mut build)?;
        bundle_urls.push((bundle.name.clone(), rendered));
    }

    let page = render_page_assets(input, &bundle_urls);
    let html = html::render_page(input.html_template.as_deref(), &page);
    build.push(OutputFile {
        path: PAGE_NAME.to_string(),
        contents: html.into_bytes(),
        bundle: None,
    });

    debug!(files = build.files.len(), bytes = build.total_size(), "rendered build");
    Ok(build)
}

/// Inline or emit every asset; returns the URL each asset module exports.
fn render_assets(
    input: &RenderInput<'_>,
    transformed: &[Vec<u8>],
    build: &mut RenderedBuild,
) -> Result<Vec<Option<String>>> {
    let plan = input.plan;
    let minify_images = plan.settings.minimizers.contains(&Minimizer::Image);
    let mut urls = vec![None; plan.modules.len()];

    for asset in &plan.assets {
        let module = plan.module(asset.module);
        let mut bytes = transformed[asset.module.index()].clone();
        if minify_images && module.kind == ModuleKind::Image {
            let ctx = StageContext {
                path: &module.path,
                settings: input.settings,
            };
            bytes = input.registry.minify(Minimizer::Image, &ctx, bytes)?;
        }

        let file_name = module.path.to_string_lossy();
        let url = match &asset.disposition {
            AssetDisposition::Inline => media::data_url(&file_name, &bytes),
            AssetDisposition::Emit(template) => {
                let ext = module
                    .path
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_default();
                let stem = module
                    .path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let path = template.render(&TemplateContext {
                    name: &stem,
                    content: &bytes,
                    ext: &ext,
                    query: "",
                })?;
                let url = format!("{}{}", input.public_path, path);
                build.push(OutputFile {
                    path,
                    contents: bytes,
                    bundle: Some(asset.bundle.clone()),
                });
                url
            }
        };
        urls[asset.module.index()] = Some(url);
    }

    Ok(urls)
}

fn render_bundle(
    input: &RenderInput<'_>,
    bundle: &BundleDescriptor,
    originals: &[Vec<u8>],
    transformed: &[Vec<u8>],
    urls: &[Option<String>],
    needs_bootstrap: bool,
    build: &mut RenderedBuild,
) -> Result<BundleUrls> {
    let plan = input.plan;
    let fidelity = input.settings.source_map;
    let mut script = String::new();
    let mut css = String::new();
    let mut script_map = SourceMap::new("", fidelity);
    let mut style_map = SourceMap::new("", fidelity);

    if bundle.is_runtime_only || needs_bootstrap {
        script.push_str(&runtime::bootstrap(plan.settings.hot_reload));
    }

    for id in &bundle.members {
        let module = plan.module(*id);
        let key = module_key(input.graph.root(), &module.path);
        let body = &transformed[id.index()];

        match module.pipeline.output {
            PipelineOutput::Script => {
                script.push_str(&runtime::define_script(&key, &String::from_utf8_lossy(body)));
                script_map.add_source(key.as_str(), &originals[id.index()]);
            }
            PipelineOutput::Style => {
                let text = String::from_utf8_lossy(body);
                match plan.settings.style_extraction {
                    StyleExtraction::Inline => {
                        script.push_str(&runtime::define_style(&key, &text));
                        script_map.add_source(key.as_str(), &originals[id.index()]);
                    }
                    StyleExtraction::SeparateFile => {
                        css.push_str(&format!("/* {key} */\n"));
                        css.push_str(text.trim_end());
                        css.push('\n');
                        style_map.add_source(key.as_str(), &originals[id.index()]);
                        script.push_str(&runtime::define_script(&key, ""));
                    }
                }
            }
            PipelineOutput::Asset(_) => {
                let url = urls[id.index()].as_deref().unwrap_or_default();
                script.push_str(&runtime::define_url(&key, url));
            }
        }
    }

    if bundle.kind == BundleKind::Entry {
        let entry = input
            .graph
            .entries()
            .iter()
            .find(|e| Some(e.name.as_str()) == bundle.entry.as_deref());
        if let Some(entry) = entry {
            script.push_str(&runtime::run_entry(&module_key(
                input.graph.root(),
                &input.graph.module(entry.module).path,
            )));
        }
    }

    let mut urls_out = BundleUrls::default();

    let script_path = emit_text(
        input,
        bundle,
        &bundle.filename_template,
        script,
        ".js",
        Minimizer::Script,
        script_map,
        build,
    )?;
    urls_out.script = Some(format!("{}{}", input.public_path, script_path));

    if let Some(template) = &bundle.style_template {
        if !css.is_empty() {
            let style_path = emit_text(input, bundle, template, css, ".css", Minimizer::Style, style_map, build)?;
            urls_out.style = Some(format!("{}{}", input.public_path, style_path));
        }
    }

    Ok(urls_out)
}

/// Minify, name, and push one script or stylesheet plus its source map.
#[allow(clippy::too_many_arguments)]
fn emit_text(
    input: &RenderInput<'_>,
    bundle: &BundleDescriptor,
    template: &kiln_core::FilenameTemplate,
    text: String,
    ext: &str,
    minimizer: Minimizer,
    mut map: SourceMap,
    build: &mut RenderedBuild,
) -> Result<String> {
    let mut bytes = text.into_bytes();
    if input.plan.settings.minimizers.contains(&minimizer) {
        let virtual_path = PathBuf::from(format!("{}{}", bundle.name, ext));
        let ctx = StageContext {
            path: &virtual_path,
            settings: input.settings,
        };
        bytes = input.registry.minify(minimizer, &ctx, bytes)?;
    }

    let path = template.render(&TemplateContext {
        name: &bundle.name,
        content: &bytes,
        ext,
        query: "",
    })?;

    if bundle.source_map {
        let file_name = path.rsplit('/').next().unwrap_or(&path).to_string();
        let map_name = format!("{file_name}.map");
        map.file = file_name;
        let reference = if ext == ".css" {
            sourcemap::style_reference(&map_name)
        } else {
            sourcemap::script_reference(&map_name)
        };
        if !bytes.ends_with(b"\n") {
            bytes.push(b'\n');
        }
        bytes.extend_from_slice(reference.as_bytes());
        build.push(OutputFile {
            path: format!("{path}.map"),
            contents: map.to_json().map_err(CliError::from)?,
            bundle: Some(bundle.name.clone()),
        });
    }

    build.push(OutputFile {
        path: path.clone(),
        contents: bytes,
        bundle: Some(bundle.name.clone()),
    });
    Ok(path)
}

/// Style links and script tags for every entry, in load order, each bundle once.
fn render_page_assets(input: &RenderInput<'_>, bundle_urls: &[(String, BundleUrls)]) -> PageAssets {
    let mut page = PageAssets::default();
    for entry in input.graph.entries() {
        for bundle in input.plan.load_order(&entry.name) {
            let Some((_, urls)) = bundle_urls.iter().find(|(name, _)| *name == bundle.name) else {
                continue;
            };
            if let Some(style) = &urls.style {
                if !page.styles.contains(style) {
                    page.styles.push(style.clone());
                }
            }
            if let Some(script) = &urls.script {
                if !page.scripts.contains(script) {
                    page.scripts.push(script.clone());
                }
            }
        }
    }
    page
}

/// Registry key of a module: `./`-prefixed path relative to the root.
pub fn module_key(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("./{}", parts.join("/"))
        }
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}

/// Read a module source from disk.
pub fn read_source(path: &Path) -> std::io::Result<Vec<u8>> {
    std::fs::read(path)
}

#[cfg(test)]
mod tests;
