//! HTTP side of the development server.
//!
//! Serves the last good build from memory, the static directory from disk,
//! and pushes reload events over Server-Sent Events.

use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tower_http::compression::CompressionLayer;
use tracing::{debug, warn};

use crate::dev::{DevEvent, RELOAD_SCRIPT_PATH, SSE_PATH, SharedState, error_overlay};
use crate::error::{CliError, Result};
use crate::output::validate_output_path;
use crate::render::{PAGE_NAME, content_type};

const RELOAD_SCRIPT: &str = include_str!("../../assets/reload-client.js");

/// Where and how the server listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub compress: bool,
    /// Answer unknown navigation requests with the HTML page.
    pub history_api_fallback: bool,
    /// Served from disk after the in-memory build.
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Clone)]
struct AppState {
    shared: SharedState,
    config: ServerConfig,
}

pub struct DevServer {
    config: ServerConfig,
    state: SharedState,
}

impl DevServer {
    pub fn new(config: ServerConfig, state: SharedState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until the task is dropped.
    pub async fn start(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", self.config.url(), e)))?;

        crate::ui::success(&format!("Development server running at {}", self.config.url()));

        axum::serve(listener, self.router())
            .await
            .map_err(|e| CliError::Server(format!("Server error: {e}")))
    }

    pub fn router(self) -> Router {
        let compress = self.config.compress;
        let router = Router::new()
            .route(SSE_PATH, get(handle_sse))
            .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
            .fallback(handle_request)
            .with_state(AppState {
                shared: self.state,
                config: self.config,
            });

        if compress {
            router.layer(CompressionLayer::new())
        } else {
            router
        }
    }
}

async fn handle_sse(State(app): State<AppState>) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = app.shared.register_client();
    debug!(client = id, "SSE client connected");
    app.shared.broadcast(&DevEvent::ClientConnected { id }).await;

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}

async fn handle_reload_script() -> Response {
    respond(StatusCode::OK, "application/javascript", RELOAD_SCRIPT)
}

async fn handle_request(State(app): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let path = match uri.path() {
        "/" => format!("/{PAGE_NAME}"),
        other => other.to_string(),
    };
    let navigation = is_navigation(&path, &headers);

    if navigation {
        if let Some(error) = app.shared.get_status().error() {
            return respond(
                StatusCode::OK,
                "text/html; charset=utf-8",
                error_overlay::render_error_overlay(error),
            );
        }
    }

    if let Some((content, kind)) = app.shared.get_cached_file(&path) {
        return respond(StatusCode::OK, kind, with_reload_script(content, kind));
    }

    if let Ok(file) = validate_output_path(&app.config.static_dir, path.trim_start_matches('/')) {
        if file.is_file() {
            match tokio::fs::read(&file).await {
                Ok(content) => {
                    let kind = content_type(&path);
                    return respond(StatusCode::OK, kind, with_reload_script(content, kind));
                }
                Err(e) => warn!(file = %file.display(), error = %e, "failed to read static file"),
            }
        }
    }

    if navigation && app.config.history_api_fallback {
        if let Some((content, kind)) = app.shared.get_cached_file(&format!("/{PAGE_NAME}")) {
            return respond(StatusCode::OK, kind, with_reload_script(content, kind));
        }
    }

    respond(StatusCode::NOT_FOUND, "text/plain; charset=utf-8", format!("File not found: {path}"))
}

/// A browser page load rather than a subresource request.
fn is_navigation(path: &str, headers: &HeaderMap) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    let html_like = !last.contains('.') || last.ends_with(".html");
    let accepts_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|accept| accept.contains("text/html") || accept.contains("*/*"));
    html_like && accepts_html
}

fn respond(status: StatusCode, kind: &str, body: impl Into<Body>) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, kind.to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        body.into(),
    )
        .into_response()
}

/// Add the reload client before `</body>` of HTML responses.
fn with_reload_script(content: Vec<u8>, kind: &str) -> Vec<u8> {
    if !kind.starts_with("text/html") {
        return content;
    }

    let html = String::from_utf8_lossy(&content);
    let tag = format!(r#"<script src="{RELOAD_SCRIPT_PATH}"></script>"#);
    let mut out = String::with_capacity(html.len() + tag.len() + 4);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(pos) => {
            out.push_str(&html[..pos]);
            out.push_str("  ");
            out.push_str(&tag);
            out.push('\n');
            out.push_str(&html[pos..]);
        }
        None => {
            out.push_str(&html);
            out.push('\n');
            out.push_str(&tag);
        }
    }
    out.into_bytes()
}
