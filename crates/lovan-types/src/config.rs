//! Client configuration types for Lovan.
//!
//! `ClientConfig` represents the `config.toml` in the data directory that
//! controls where the backend lives and how requests are made.

use serde::{Deserialize, Serialize};

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Top-level configuration for the Lovan client.
///
/// Loaded from `~/.lovan/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the analysis backend (no trailing slash needed).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout; slow model replies count as network failures.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// File name of the persisted credential blob inside the data directory.
    #[serde(default = "default_credential_file")]
    pub credential_file: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_api_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_credential_file() -> String {
    "la_user.json".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            credential_file: default_credential_file(),
            log_format: LogFormat::default(),
        }
    }
}
