//! Filesystem locations for credentials and configuration.
//!
//! Everything lives under `~/.gerschel`, which is where the portal's
//! API-key instructions tell users to save their token.

use std::path::PathBuf;

/// Get the Gerschel data directory (`~/.gerschel`).
pub fn get_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gerschel")
}

/// Default path of the bearer token file.
pub fn get_token_path() -> PathBuf {
    get_data_dir().join("db-api-token")
}

/// Default path of the optional JSON config file.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("mcp_config.json")
}
