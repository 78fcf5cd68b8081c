//! Server configuration.
//!
//! Layering: built-in defaults, then the optional JSON file
//! (`~/.gerschel/mcp_config.json` or `$GERSCHEL_DB_CONFIG`), then individual
//! environment variable overrides.

pub mod paths;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use paths::{get_config_path, get_token_path};

const ENV_CONFIG: &str = "GERSCHEL_DB_CONFIG";
const ENV_API_URL: &str = "GERSCHEL_DB_API_URL";
const ENV_TOKEN_PATH: &str = "GERSCHEL_DB_TOKEN_PATH";
const ENV_TIMEOUT_SECS: &str = "GERSCHEL_DB_TIMEOUT_SECS";
const ENV_LOG_DIR: &str = "GERSCHEL_DB_LOG_DIR";

/// Root configuration for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Endpoint that receives `{"query": ...}` POSTs.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// File holding the bearer token. Read on every tool call.
    #[serde(default = "get_token_path")]
    pub token_path: PathBuf,
    /// Page where users generate a token; shown when the token is missing.
    #[serde(default = "default_api_keys_url")]
    pub api_keys_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_server_name")]
    pub server_name: String,
    #[serde(default = "default_server_version")]
    pub server_version: String,
    /// Directory for rolling log files. Stderr only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_path: get_token_path(),
            api_keys_url: default_api_keys_url(),
            request_timeout_secs: default_request_timeout_secs(),
            server_name: default_server_name(),
            server_version: default_server_version(),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Load the configuration from the config file and process environment.
    pub fn load() -> Self {
        let path = std::env::var_os(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(get_config_path);
        let base: ServerConfig = read_json_file(&path).unwrap_or_default();
        base.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides using `lookup` to resolve variables.
    ///
    /// Empty values are ignored, as is an unparsable timeout.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(path) = get(ENV_TOKEN_PATH) {
            self.token_path = PathBuf::from(path);
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            match secs.trim().parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(e) => warn!("Ignoring {}={:?}: {}", ENV_TIMEOUT_SECS, secs, e),
            }
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        self
    }
}

/// Read a JSON file and deserialize it. Missing files are silent.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}

// ============ Default value functions ============

fn default_api_url() -> String { "https://portal.gerschellaw.com/api/sql-query".into() }
fn default_api_keys_url() -> String { "https://portal.gerschellaw.com/tools/api-keys".into() }
fn default_request_timeout_secs() -> u64 { 60 }
fn default_server_name() -> String { "gerschel-db".into() }
fn default_server_version() -> String { "1.0.0".into() }
