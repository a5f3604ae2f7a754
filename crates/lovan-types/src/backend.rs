//! Request/response shapes exchanged with the analysis backend.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::analysis::RoleTag;
use crate::chat::{ChatTurn, ContextEntry};
use crate::history::RecordId;

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub role: RoleTag,
    pub message: String,
}

/// Body of `POST /api/chat`.
///
/// `history` is the context payload: the analysis preamble followed by the
/// prior turns. The new user message travels separately in `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub role: RoleTag,
    pub message: String,
    pub history: Vec<ContextEntry>,
}

/// Body of `POST /api/chat/save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveTranscriptRequest {
    pub analysis_id: RecordId,
    pub chat_history: Vec<ChatTurn>,
}

/// Email/password pair for login and registration.
///
/// Not serializable: the HTTP layer exposes the password only while
/// building the request body.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Successful login: the user object and the issued bearer token.
#[derive(Debug)]
pub struct AuthGrant {
    pub subject_id: Option<String>,
    pub email: String,
    pub access_token: SecretString,
}
