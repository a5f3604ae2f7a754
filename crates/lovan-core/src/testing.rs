//! Test doubles shared by the controller tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};

use lovan_types::analysis::{AnalysisResult, FlagTag, RoleTag};
use lovan_types::backend::{
    AnalyzeRequest, AuthGrant, ChatRequest, Credentials, SaveTranscriptRequest,
};
use lovan_types::chat::ChatTurn;
use lovan_types::error::BackendError;
use lovan_types::history::{HistoryRecord, RecordId};
use lovan_types::identity::AuthenticatedIdentity;

use crate::backend::AnalyzerBackend;
use crate::gate::controller::Controller;
use crate::session::memory::MemoryCredentialStore;
use crate::session::store::SessionStore;

/// Backend that replays queued responses and records what it was sent.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    analyses: Mutex<VecDeque<Result<AnalysisResult, BackendError>>>,
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    grants: Mutex<VecDeque<Result<AuthGrant, BackendError>>>,
    history: Mutex<Vec<HistoryRecord>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    analyze_tokens: Mutex<Vec<Option<String>>>,
    registrations: Mutex<Vec<String>>,
    saved: Mutex<Vec<SaveTranscriptRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_analysis(&self, outcome: Result<AnalysisResult, BackendError>) {
        self.analyses.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn push_reply(&self, outcome: Result<String, BackendError>) {
        self.replies.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn push_grant(&self, outcome: Result<AuthGrant, BackendError>) {
        self.grants.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn set_history(&self, records: Vec<HistoryRecord>) {
        *self.history.lock().unwrap() = records;
    }

    pub(crate) fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub(crate) fn analyze_tokens(&self) -> Vec<Option<String>> {
        self.analyze_tokens.lock().unwrap().clone()
    }

    pub(crate) fn registrations(&self) -> Vec<String> {
        self.registrations.lock().unwrap().clone()
    }

    pub(crate) fn saved(&self) -> Vec<SaveTranscriptRequest> {
        self.saved.lock().unwrap().clone()
    }
}

fn unscripted() -> BackendError {
    BackendError::Network("no scripted response".to_string())
}

impl AnalyzerBackend for ScriptedBackend {
    async fn analyze(
        &self,
        _request: &AnalyzeRequest,
        token: Option<&SecretString>,
    ) -> Result<AnalysisResult, BackendError> {
        self.analyze_tokens
            .lock()
            .unwrap()
            .push(token.map(|t| t.expose_secret().to_owned()));
        self.analyses.lock().unwrap().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn chat(&self, request: &ChatRequest, _token: &SecretString) -> Result<String, BackendError> {
        self.chat_requests.lock().unwrap().push(request.clone());
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn login(&self, _credentials: &Credentials) -> Result<AuthGrant, BackendError> {
        self.grants.lock().unwrap().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), BackendError> {
        self.registrations
            .lock()
            .unwrap()
            .push(credentials.email.clone());
        Ok(())
    }

    async fn fetch_history(&self, _token: &SecretString) -> Result<Vec<HistoryRecord>, BackendError> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn save_transcript(
        &self,
        request: &SaveTranscriptRequest,
        _token: &SecretString,
    ) -> Result<(), BackendError> {
        self.saved.lock().unwrap().push(request.clone());
        Ok(())
    }
}

pub(crate) type TestController = Controller<ScriptedBackend, MemoryCredentialStore>;

pub(crate) fn anonymous_controller() -> TestController {
    Controller::new(
        ScriptedBackend::new(),
        SessionStore::new(MemoryCredentialStore::new()),
    )
}

pub(crate) async fn authenticated_controller() -> TestController {
    let mut controller = anonymous_controller();
    controller.authenticate(test_identity()).await;
    controller
}

pub(crate) fn test_identity() -> AuthenticatedIdentity {
    AuthenticatedIdentity::new(
        Some("u-1".to_string()),
        "ana@example.com".to_string(),
        SecretString::from("tok-ana"),
    )
}

pub(crate) fn sample_result(summary: &str) -> AnalysisResult {
    AnalysisResult {
        context_summary: summary.to_string(),
        flags: vec![
            FlagTag::new("🚩 Red flag: culpabilización"),
            FlagTag::new("🟨 Yellow flag: reclamo"),
        ],
        abuse_detected: false,
        final_recommendation: "Responde con calma.".to_string(),
        suggested_replies: vec!["Estaba ocupado, hablemos luego.".to_string()],
    }
}

pub(crate) fn history_record(id: &str, role: RoleTag, turns: Vec<ChatTurn>) -> HistoryRecord {
    HistoryRecord {
        id: RecordId::new(id),
        role,
        original_message: format!("mensaje {id}"),
        result: sample_result(&format!("contexto {id}")),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap(),
        chat_history: turns,
    }
}

/// Drive a controller from `Idle` to `Results` with a scripted analysis.
pub(crate) async fn analyzed(controller: &mut TestController, role: &str, summary: &str) {
    controller.new_analysis();
    controller.backend().push_analysis(Ok(sample_result(summary)));
    controller.request_analysis().unwrap();
    controller.submit(role, "¿por qué nunca respondes?").await.unwrap();
}
