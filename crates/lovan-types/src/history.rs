//! Saved analyses returned by the history store.
//!
//! Records are read-only to the client. The wire shape comes straight from
//! the store's `analyses` table, so ids may be numbers or strings and the
//! saved transcript may be `null` or lack ordinals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use std::fmt;

use crate::analysis::{AnalysisResult, RoleTag};
use crate::chat::{ChatTurn, Speaker};
use crate::error::ShapeError;

/// Server-side identifier of a saved analysis, normalized to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => RecordId(s),
            RawId::Number(n) => RecordId(n.to_string()),
        })
    }
}

/// A completed analysis and its saved follow-up transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HistoryRecordWire")]
pub struct HistoryRecord {
    pub id: RecordId,
    pub role: RoleTag,
    pub original_message: String,
    #[serde(rename = "ai_analysis")]
    pub result: AnalysisResult,
    pub created_at: DateTime<Utc>,
    pub chat_history: Vec<ChatTurn>,
}

/// Saved turn as stored; older transcripts carry no ordinal.
#[derive(Deserialize)]
struct SavedTurnWire {
    role: String,
    #[serde(default)]
    text: String,
    ordinal: Option<u64>,
    #[serde(default)]
    is_error: bool,
}

#[derive(Deserialize)]
struct HistoryRecordWire {
    id: RecordId,
    role: String,
    #[serde(default)]
    original_message: Option<String>,
    #[serde(alias = "result")]
    ai_analysis: serde_json::Value,
    created_at: DateTime<Utc>,
    #[serde(default)]
    chat_history: Option<Vec<SavedTurnWire>>,
}

impl TryFrom<HistoryRecordWire> for HistoryRecord {
    type Error = ShapeError;

    fn try_from(wire: HistoryRecordWire) -> Result<Self, Self::Error> {
        let role = wire.role.parse::<RoleTag>().map_err(|reason| ShapeError::Malformed {
            what: "history record role",
            reason,
        })?;
        let result = AnalysisResult::from_value(wire.ai_analysis)?;

        let chat_history = wire
            .chat_history
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(position, turn)| {
                let speaker = turn.role.parse::<Speaker>().map_err(|reason| {
                    ShapeError::Malformed {
                        what: "saved chat turn",
                        reason,
                    }
                })?;
                Ok(ChatTurn {
                    speaker,
                    text: turn.text,
                    ordinal: turn.ordinal.unwrap_or(position as u64),
                    is_error: turn.is_error,
                })
            })
            .collect::<Result<Vec<_>, ShapeError>>()?;

        Ok(Self {
            id: wire.id,
            role,
            original_message: wire.original_message.unwrap_or_default(),
            result,
            created_at: wire.created_at,
            chat_history,
        })
    }
}
