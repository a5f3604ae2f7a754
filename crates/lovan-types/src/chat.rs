//! Follow-up chat types: turns, context entries, and the active analysis.
//!
//! A conversation thread is always bound to exactly one [`ActiveAnalysis`].
//! Turns are ordered by their `ordinal`, never by arrival time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::analysis::{AnalysisResult, RoleTag};
use crate::history::RecordId;

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Model => write!(f, "model"),
        }
    }
}

impl FromStr for Speaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Speaker::User),
            "model" | "assistant" => Ok(Speaker::Model),
            other => Err(format!("invalid speaker: '{other}'")),
        }
    }
}

/// One message within a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(rename = "role")]
    pub speaker: Speaker,
    pub text: String,
    pub ordinal: u64,
    /// Synthetic model turn reporting a failed request.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ChatTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>, ordinal: u64) -> Self {
        Self {
            speaker,
            text: text.into(),
            ordinal,
            is_error: false,
        }
    }

    /// Model turn carrying a failure marker instead of a reply.
    ///
    /// `marker` is stored as shown to the user.
    pub fn error(marker: impl Into<String>, ordinal: u64) -> Self {
        Self {
            speaker: Speaker::Model,
            text: marker.into(),
            ordinal,
            is_error: true,
        }
    }
}

/// One entry of the context payload sent with every chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub role: Speaker,
    pub text: String,
}

impl From<&ChatTurn> for ContextEntry {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.speaker,
            text: turn.text.clone(),
        }
    }
}

/// Identifier minted every time an analysis becomes active.
///
/// In-flight requests carry the id they were issued under so that stale
/// completions can be recognized after the active analysis changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisId(pub Uuid);

impl AnalysisId {
    /// Create a new AnalysisId using UUID v7 (time-sortable).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the active analysis came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record_id", rename_all = "lowercase")]
pub enum AnalysisSource {
    /// Produced by a submission in this session.
    Fresh,
    /// Re-activated from a saved history record.
    Resumed(RecordId),
}

/// The single analysis the conversation thread is currently bound to.
///
/// Fields are private: an active analysis is replaced wholesale, never edited.
/// The id is a per-activation staleness tag and is not serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveAnalysis {
    #[serde(skip)]
    id: AnalysisId,
    role: RoleTag,
    result: AnalysisResult,
    source: AnalysisSource,
}

impl ActiveAnalysis {
    pub fn new(role: RoleTag, result: AnalysisResult, source: AnalysisSource) -> Self {
        Self {
            id: AnalysisId::new(),
            role,
            result,
            source,
        }
    }

    pub fn id(&self) -> AnalysisId {
        self.id
    }

    pub fn role(&self) -> RoleTag {
        self.role
    }

    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    pub fn source(&self) -> &AnalysisSource {
        &self.source
    }

    /// Saved record id, if this analysis was resumed from history.
    pub fn record_id(&self) -> Option<&RecordId> {
        match &self.source {
            AnalysisSource::Resumed(id) => Some(id),
            AnalysisSource::Fresh => None,
        }
    }
}
