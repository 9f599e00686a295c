//! `kiln serve`: development server with rebuild-on-change.
//!
//! Builds go to memory only. Each change to a watched file re-reads the
//! module graph, rebuilds, swaps the cache and tells connected browsers to
//! reload; a failed rebuild leaves the previous output in place and switches
//! page loads to the error overlay.

use std::sync::Arc;
use std::time::Instant;

use tokio::signal;
use tracing::debug;

use crate::cli::ServeArgs;
use crate::commands::pipeline;
use crate::config::Project;
use crate::dev::watcher::WatchFilter;
use crate::dev::{BundleCache, DevEvent, DevServer, DevServerState, FileChange, FileWatcher, ServerConfig, SharedState};
use crate::error::{CliError, Result};
use crate::ui;

/// Execute the serve command.
///
/// # Process Flow
///
/// 1. Validate the project and run the initial build
/// 2. Start the file watcher and the HTTP server
/// 3. Open a browser unless disabled or running under CI
/// 4. Rebuild on every change until Ctrl+C
pub async fn execute(args: ServeArgs, project: Project) -> Result<()> {
    project.validate()?;

    let dev = project.config.dev.clone();
    let config = ServerConfig {
        host: args.host.clone().unwrap_or_else(|| dev.host.clone()),
        port: args.port.unwrap_or(dev.port),
        compress: dev.compress,
        history_api_fallback: dev.history_api_fallback,
        static_dir: project.static_dir(),
    };
    let open = args.open_override().unwrap_or(dev.open) && !ui::is_ci();
    let filter = WatchFilter::new(project.root.clone(), vec![project.output_dir()], dev.watch_ignore.clone());

    let project = Arc::new(project);
    let state: SharedState = Arc::new(DevServerState::new());

    ui::info(&format!("Starting development server ({})...", project.mode));
    state.start_build();
    match build(&project).await {
        Ok((duration_ms, cache)) => {
            ui::success(&format!("Initial build completed in {duration_ms}ms ({} files)", cache.len()));
            state.complete_build(duration_ms, cache);
        }
        Err(e) => {
            ui::error(&format!("Initial build failed: {e}"));
            return Err(e);
        }
    }

    let (watcher, mut changes) = FileWatcher::new(filter, dev.debounce_ms)?;
    ui::info(&format!("Watching for changes in {}", watcher.root().display()));

    let url = config.url();
    let server = DevServer::new(config, Arc::clone(&state));
    let mut server_handle = tokio::spawn(server.start());

    if open {
        open_browser(&url);
    }

    ui::info("Press Ctrl+C to stop");
    loop {
        tokio::select! {
            Some(change) = changes.recv() => {
                handle_file_change(change, &project, &state).await;
            }
            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break;
            }
            result = &mut server_handle => {
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(CliError::Server(format!("server task failed: {e}"))),
                };
            }
        }
    }

    server_handle.abort();
    ui::success("Development server stopped");
    Ok(())
}

/// Plan and render off the async runtime.
async fn build(project: &Arc<Project>) -> Result<(u64, BundleCache)> {
    let project = Arc::clone(project);
    tokio::task::spawn_blocking(move || {
        let start = Instant::now();
        let (_, rendered) = pipeline::plan_and_render(&project)?;
        Ok((start.elapsed().as_millis() as u64, BundleCache::from_build(rendered)))
    })
    .await
    .map_err(|e| CliError::Custom(format!("build task failed: {e}")))?
}

async fn handle_file_change(change: FileChange, project: &Arc<Project>, state: &SharedState) {
    debug!(?change, "rebuilding");
    ui::info(&format!("File changed: {}", change.path().display()));

    state.start_build();
    state.broadcast(&DevEvent::BuildStarted).await;

    match build(project).await {
        Ok((duration_ms, cache)) => {
            state.complete_build(duration_ms, cache);
            ui::success(&format!("Rebuild completed in {duration_ms}ms"));
            state.broadcast(&DevEvent::BuildCompleted { duration_ms }).await;
        }
        Err(e) => {
            let error = e.to_string();
            state.fail_build(error.clone());
            ui::error(&format!("Rebuild failed: {error}"));
            state.broadcast(&DevEvent::BuildFailed { error }).await;
        }
    }
}

/// Open `url` in the default browser.
fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {url}")),
        Err(e) => ui::warning(&format!("Failed to open browser: {e}")),
    }
}
