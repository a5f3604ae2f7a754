//! HttpBackend -- concrete [`AnalyzerBackend`] over the backend's JSON API.
//!
//! Endpoints: `/api/analyze`, `/api/chat`, `/api/chat/save`,
//! `/api/auth/login`, `/api/auth/register`, `/api/history`, `/api/health`.
//!
//! Bearer tokens are only exposed while setting the `Authorization` header
//! and never appear in logs.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use lovan_core::backend::AnalyzerBackend;
use lovan_types::analysis::AnalysisResult;
use lovan_types::backend::{
    AnalyzeRequest, AuthGrant, ChatRequest, Credentials, SaveTranscriptRequest,
};
use lovan_types::config::ClientConfig;
use lovan_types::error::BackendError;
use lovan_types::history::HistoryRecord;

use super::wire::{
    AnalyzeResponse, ChatResponse, HealthStatus, HistoryResponse, LoginResponse,
};

/// Client for the analysis backend.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend client. A trailing `/` on `base_url` is ignored.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lovan/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Create a client using the timeout from `config`.
    pub fn from_config(config: &ClientConfig, base_url: impl Into<String>) -> Self {
        Self::new(base_url, Duration::from_secs(config.request_timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and unwrap the response envelope.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&SecretString>,
    ) -> Result<Value, BackendError> {
        let request = match token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        read_envelope(response).await
    }

    /// Ping `GET /api/health`.
    pub async fn health(&self) -> Result<HealthStatus, BackendError> {
        let value = self.send(self.client.get(self.url("/api/health")), None).await?;
        decode(value, "health status")
    }
}

/// Map a response to its JSON body, or to the error its envelope carries.
async fn read_envelope(response: reqwest::Response) -> Result<Value, BackendError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::Network(format!("failed to read response: {e}")))?;
    let value = serde_json::from_str::<Value>(&body).ok();

    if !status.is_success() {
        let message = value
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(match status {
            StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
            _ => BackendError::Rejected(message),
        });
    }

    let value = value.ok_or_else(|| {
        BackendError::InvalidResponse(format!("HTTP {status} body is not JSON"))
    })?;
    let error = value.get("error").and_then(Value::as_str);
    let declined = value.get("success").and_then(Value::as_bool) == Some(false);
    if error.is_some() || declined {
        let message = error.unwrap_or("request was not successful");
        return Err(BackendError::Rejected(message.to_string()));
    }
    Ok(value)
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, BackendError> {
    serde_json::from_value(value)
        .map_err(|e| BackendError::InvalidResponse(format!("malformed {what}: {e}")))
}

fn credentials_body(credentials: &Credentials) -> Value {
    json!({
        "email": credentials.email,
        "password": credentials.password.expose_secret(),
    })
}

impl AnalyzerBackend for HttpBackend {
    async fn analyze(
        &self,
        request: &AnalyzeRequest,
        token: Option<&SecretString>,
    ) -> Result<AnalysisResult, BackendError> {
        debug!(role = %request.role, authenticated = token.is_some(), "POST /api/analyze");
        let value = self
            .send(self.client.post(self.url("/api/analyze")).json(request), token)
            .await?;
        let response: AnalyzeResponse = decode(value, "analysis response")?;
        Ok(AnalysisResult::from_value(response.analysis)?)
    }

    async fn chat(&self, request: &ChatRequest, token: &SecretString) -> Result<String, BackendError> {
        debug!(role = %request.role, history = request.history.len(), "POST /api/chat");
        let value = self
            .send(self.client.post(self.url("/api/chat")).json(request), Some(token))
            .await?;
        let response: ChatResponse = decode(value, "chat response")?;
        Ok(response.reply)
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, BackendError> {
        debug!(email = %credentials.email, "POST /api/auth/login");
        let value = self
            .send(
                self.client
                    .post(self.url("/api/auth/login"))
                    .json(&credentials_body(credentials)),
                None,
            )
            .await?;
        let response: LoginResponse = decode(value, "login response")?;
        if response.access_token.trim().is_empty() {
            return Err(BackendError::InvalidResponse(
                "login response carries no access token".to_string(),
            ));
        }
        Ok(AuthGrant {
            subject_id: response.user.id,
            email: response.user.email,
            access_token: SecretString::from(response.access_token),
        })
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), BackendError> {
        debug!(email = %credentials.email, "POST /api/auth/register");
        self.send(
            self.client
                .post(self.url("/api/auth/register"))
                .json(&credentials_body(credentials)),
            None,
        )
        .await?;
        Ok(())
    }

    async fn fetch_history(&self, token: &SecretString) -> Result<Vec<HistoryRecord>, BackendError> {
        let value = self
            .send(self.client.get(self.url("/api/history")), Some(token))
            .await?;
        let response: HistoryResponse = decode(value, "history response")?;

        let total = response.analyses.len();
        let records: Vec<HistoryRecord> = response
            .analyses
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value::<HistoryRecord>(raw) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(index, "Skipping malformed history record: {err}");
                    None
                }
            })
            .collect();
        debug!(total, kept = records.len(), "GET /api/history");
        Ok(records)
    }

    async fn save_transcript(
        &self,
        request: &SaveTranscriptRequest,
        token: &SecretString,
    ) -> Result<(), BackendError> {
        debug!(
            record_id = %request.analysis_id,
            turns = request.chat_history.len(),
            "POST /api/chat/save"
        );
        self.send(
            self.client.post(self.url("/api/chat/save")).json(request),
            Some(token),
        )
        .await?;
        Ok(())
    }
}
