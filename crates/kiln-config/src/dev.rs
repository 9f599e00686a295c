//! Development server configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Open a browser once the server is listening.
    #[serde(default = "default_true")]
    pub open: bool,

    /// Gzip responses.
    #[serde(default = "default_true")]
    pub compress: bool,

    /// Serve the HTML page for unknown navigation requests.
    #[serde(default = "default_true")]
    pub history_api_fallback: bool,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Extra path fragments the watcher ignores.
    #[serde(default)]
    pub watch_ignore: Vec<String>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open: true,
            compress: true,
            history_api_fallback: true,
            debounce_ms: default_debounce_ms(),
            watch_ignore: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    100
}
