//! Shared state for the development server.
//!
//! Build status, the in-memory output of the last good build and the SSE
//! client registry, each behind a `parking_lot` lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::dev::DevEvent;
use crate::render::{RenderedBuild, content_type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    NotStarted,
    InProgress { started_at: Instant },
    Success { duration_ms: u64 },
    Failed { error: String },
}

impl BuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success { .. })
    }

    /// Error message of a failed build.
    pub fn error(&self) -> Option<&str> {
        match self {
            BuildStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Rendered files keyed by URL path (`/static/js/main.js`).
#[derive(Debug, Clone, Default)]
pub struct BundleCache {
    files: HashMap<String, (Vec<u8>, &'static str)>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_build(build: RenderedBuild) -> Self {
        let mut cache = Self::new();
        for file in build.files {
            let url = format!("/{}", file.path);
            let kind = content_type(&file.path);
            cache.insert(url, file.contents, kind);
        }
        cache
    }

    pub fn insert(&mut self, path: String, content: Vec<u8>, content_type: &'static str) {
        self.files.insert(path, (content, content_type));
    }

    pub fn get(&self, path: &str) -> Option<&(Vec<u8>, &'static str)> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Connected SSE clients.
pub type ClientRegistry = Arc<RwLock<HashMap<usize, mpsc::Sender<String>>>>;

pub struct DevServerState {
    pub status: RwLock<BuildStatus>,
    pub cache: RwLock<BundleCache>,
    pub clients: ClientRegistry,
    next_client_id: RwLock<usize>,
}

impl DevServerState {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(BuildStatus::NotStarted),
            cache: RwLock::new(BundleCache::new()),
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: RwLock::new(0),
        }
    }

    pub fn start_build(&self) {
        *self.status.write() = BuildStatus::InProgress {
            started_at: Instant::now(),
        };
    }

    /// Record a successful build and swap in its output.
    pub fn complete_build(&self, duration_ms: u64, cache: BundleCache) {
        *self.cache.write() = cache;
        *self.status.write() = BuildStatus::Success { duration_ms };
    }

    /// Record a failed build. The previous output stays cached.
    pub fn fail_build(&self, error: String) {
        *self.status.write() = BuildStatus::Failed { error };
    }

    pub fn get_status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    pub fn get_cached_file(&self, path: &str) -> Option<(Vec<u8>, &'static str)> {
        self.cache.read().get(path).cloned()
    }

    /// Register a new SSE client and return its id and event receiver.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = {
            let mut next_id = self.next_client_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let (tx, rx) = mpsc::channel(100);
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Send `event` to every client, dropping the ones that went away.
    pub async fn broadcast(&self, event: &DevEvent) {
        let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
        let clients = self.clients.read().clone();

        let mut gone = Vec::new();
        for (id, tx) in clients {
            if tx.send(json.clone()).await.is_err() {
                gone.push(id);
            }
        }
        for id in gone {
            self.unregister_client(id);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

impl Default for DevServerState {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedState = Arc<DevServerState>;
