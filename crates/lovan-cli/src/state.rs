//! Application state wiring the controller to its infrastructure.
//!
//! The controller is generic over its backend and credential store; AppState
//! pins it to the HTTP backend and the credential file in the data directory.

use std::path::PathBuf;

use anyhow::Context;

use lovan_core::gate::controller::Controller;
use lovan_core::session::store::SessionStore;
use lovan_infra::config::{load_client_config, resolve_api_base_url};
use lovan_infra::credential::file::FileCredentialStore;
use lovan_infra::filesystem::{credential_path, resolve_data_dir};
use lovan_infra::http::HttpBackend;
use lovan_types::config::ClientConfig;

/// Controller pinned to the concrete infra implementations.
pub type ConcreteController = Controller<HttpBackend, FileCredentialStore>;

pub struct AppState {
    pub controller: ConcreteController,
}

impl AppState {
    /// Load configuration and restore the stored session.
    ///
    /// A missing or corrupt session is not an error; the client starts
    /// anonymous.
    pub async fn init(config: ClientConfig, data_dir: PathBuf, api_url: Option<&str>) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let base_url = resolve_api_base_url(&config, api_url);
        let backend = HttpBackend::from_config(&config, base_url);
        let store = FileCredentialStore::new(credential_path(&data_dir, &config));

        let mut controller = Controller::new(backend, SessionStore::new(store));
        controller.restore_session().await;

        Ok(Self { controller })
    }

    /// Resolve the data directory and read `config.toml` from it.
    pub async fn load_config() -> (ClientConfig, PathBuf) {
        let data_dir = resolve_data_dir();
        let config = load_client_config(&data_dir).await;
        (config, data_dir)
    }
}
