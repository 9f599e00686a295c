//! `kiln build`: plan, render and write a build to the output directory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::cli::BuildArgs;
use crate::commands::pipeline;
use crate::config::{Project, absolutize};
use crate::error::Result;
use crate::output::{copy_static, replace_output_dir, validate_output_dir, write_files};
use crate::ui::{self, SummaryRow};

/// Execute the build command.
///
/// # Build Process
///
/// 1. Validate the project and load the module graph
/// 2. Classify, partition and emit a plan
/// 3. Render every bundle in memory; a transform failure stops here
/// 4. Copy static files and write the bundles into a staging directory
///    that replaces the output directory once complete
/// 5. Print the build summary
///
/// With `--dry-run` the plan is printed as JSON on stdout after step 2 and
/// nothing is written.
pub async fn execute(args: BuildArgs, project: Project) -> Result<()> {
    let start = Instant::now();
    project.validate()?;

    let out_dir = match &args.out_dir {
        Some(dir) => absolutize(dir, &project.root),
        None => project.output_dir(),
    };
    validate_output_dir(&out_dir, &project.root, &project.input_paths())?;

    ui::info(&format!("Building for {}...", project.mode));
    let planned = pipeline::plan(&project)?;

    if args.dry_run {
        let json = serde_json::to_string_pretty(&planned.plan)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}")?;
        return Ok(());
    }

    let rendered = pipeline::render(&project, &planned)?;

    let write = |dir: &Path| -> Result<Vec<PathBuf>> {
        let mut copied = Vec::new();
        if let Some(static_copy) = &planned.plan.static_copy {
            copied = copy_static(static_copy, dir)?;
        }
        write_files(dir, &rendered.files)?;
        Ok(copied)
    };
    let copied = if planned.plan.settings.clean_before_write {
        replace_output_dir(&out_dir, write)?
    } else {
        write(&out_dir)?
    };

    info!(
        files = rendered.files.len(),
        static_files = copied.len(),
        out_dir = %out_dir.display(),
        "build written"
    );

    let rows: Vec<SummaryRow> = rendered
        .files
        .iter()
        .map(|file| SummaryRow {
            path: file.path.clone(),
            size: file.contents.len() as u64,
            bundle: file.bundle.clone(),
        })
        .collect();
    ui::print_build_summary(&rows, start.elapsed());
    if !copied.is_empty() {
        ui::info(&format!("Copied {} static files", copied.len()));
    }
    ui::success(&format!("Built to {}", out_dir.display()));

    Ok(())
}
