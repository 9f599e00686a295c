//! Development server.
//!
//! - builds in memory and serves from a cache
//! - pushes reload events over Server-Sent Events
//! - watches the project and rebuilds on change
//! - shows an error overlay while the last build is broken

pub mod error_overlay;
pub mod server;
pub mod state;
pub mod watcher;

pub use server::{DevServer, ServerConfig};
pub use state::{BuildStatus, BundleCache, DevServerState, SharedState};
pub use watcher::{FileChange, FileWatcher};

use serde::{Deserialize, Serialize};

/// URL of the event stream.
pub const SSE_PATH: &str = "/__kiln_sse__";
/// URL of the reload client script.
pub const RELOAD_SCRIPT_PATH: &str = "/__kiln_reload__.js";

/// Events pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    BuildStarted,
    BuildCompleted { duration_ms: u64 },
    BuildFailed { error: String },
    ClientConnected { id: usize },
}
