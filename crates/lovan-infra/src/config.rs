//! Client configuration loader for Lovan.
//!
//! Reads `config.toml` from the data directory (`~/.lovan/` in production)
//! and deserializes it into [`ClientConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use lovan_types::config::ClientConfig;

use crate::filesystem::config_path;

/// Environment variable that overrides `api_base_url`.
pub const API_URL_ENV: &str = "LOVAN_API_URL";

/// Minimum request timeout (safety floor).
const MIN_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - The timeout floor is applied to whatever was loaded.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return ClientConfig::default();
        }
    };

    let mut config = match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            ClientConfig::default()
        }
    };
    config.request_timeout_secs = config.request_timeout_secs.max(MIN_REQUEST_TIMEOUT_SECS);
    config
}

/// Resolve the backend base URL.
///
/// Priority:
/// 1. Explicit override (the CLI `--api-url` flag)
/// 2. `LOVAN_API_URL` environment variable
/// 3. `api_base_url` from `config.toml`
pub fn resolve_api_base_url(config: &ClientConfig, cli_override: Option<&str>) -> String {
    let env_override = std::env::var(API_URL_ENV).ok();
    pick_base_url(config, cli_override, env_override.as_deref())
}

fn pick_base_url(config: &ClientConfig, cli: Option<&str>, env: Option<&str>) -> String {
    [cli, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(config.api_base_url.as_str())
        .trim_end_matches('/')
        .to_string()
}
