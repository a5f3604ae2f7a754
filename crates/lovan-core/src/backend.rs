//! AnalyzerBackend trait definition.
//!
//! The remote service is a black box: it analyzes messages, answers
//! follow-up chat turns, issues tokens, and stores history. Implementations
//! live in lovan-infra (e.g., `HttpBackend`).

use secrecy::SecretString;

use lovan_types::analysis::AnalysisResult;
use lovan_types::backend::{
    AnalyzeRequest, AuthGrant, ChatRequest, Credentials, SaveTranscriptRequest,
};
use lovan_types::error::BackendError;
use lovan_types::history::HistoryRecord;

/// Port to the analysis, chat, auth, and history endpoints.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait AnalyzerBackend: Send + Sync {
    /// Analyze a received message. The token is optional: anonymous users may
    /// analyze, authenticated analyses are additionally saved server-side.
    fn analyze(
        &self,
        request: &AnalyzeRequest,
        token: Option<&SecretString>,
    ) -> impl std::future::Future<Output = Result<AnalysisResult, BackendError>> + Send;

    /// Send one follow-up chat turn and receive the model's reply.
    fn chat(
        &self,
        request: &ChatRequest,
        token: &SecretString,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send;

    /// Exchange credentials for a bearer token.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<AuthGrant, BackendError>> + Send;

    /// Create an account. Never logs in.
    fn register(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;

    /// Saved analyses of the token's owner, newest first.
    fn fetch_history(
        &self,
        token: &SecretString,
    ) -> impl std::future::Future<Output = Result<Vec<HistoryRecord>, BackendError>> + Send;

    /// Overwrite the saved transcript of one history record.
    fn save_transcript(
        &self,
        request: &SaveTranscriptRequest,
        token: &SecretString,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;
}
