//! Response envelopes returned by the backend.
//!
//! Every endpoint answers `{success, ...}` on success and `{error}` on
//! failure. These structs only describe the success payloads; failure
//! envelopes are handled in [`super::client`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeResponse {
    pub analysis: Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponse {
    pub access_token: String,
    pub user: LoginUser,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryResponse {
    #[serde(default)]
    pub analyses: Vec<Value>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
