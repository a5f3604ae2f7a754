//! Analysis result types returned by the AI backend.
//!
//! The backend speaks Spanish on the wire (`contexto`, `abuso_detectado`, ...).
//! Field names here are English; serde renames map them to the wire keys and
//! accept the English names as aliases.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::ShapeError;

/// Declared relationship of the message's sender to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleTag {
    #[serde(rename = "pareja")]
    Partner,
    #[serde(rename = "esposo")]
    Spouse,
    #[serde(rename = "amigo")]
    Friend,
    #[serde(rename = "familiar")]
    Family,
    #[serde(rename = "crush")]
    Crush,
    #[serde(rename = "ex")]
    Ex,
}

impl RoleTag {
    /// Every role, in the order the selection UI lists them.
    pub const ALL: [RoleTag; 6] = [
        RoleTag::Partner,
        RoleTag::Spouse,
        RoleTag::Friend,
        RoleTag::Family,
        RoleTag::Crush,
        RoleTag::Ex,
    ];

    /// Key sent to the backend.
    pub fn as_key(&self) -> &'static str {
        match self {
            RoleTag::Partner => "pareja",
            RoleTag::Spouse => "esposo",
            RoleTag::Friend => "amigo",
            RoleTag::Family => "familiar",
            RoleTag::Crush => "crush",
            RoleTag::Ex => "ex",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RoleTag::Partner => "Pareja actual",
            RoleTag::Spouse => "Esposo/a",
            RoleTag::Friend => "Amigo/a",
            RoleTag::Family => "Familiar",
            RoleTag::Crush => "Crush / Casi algo",
            RoleTag::Ex => "Ex-pareja",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for RoleTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pareja" | "partner" => Ok(RoleTag::Partner),
            "esposo" | "esposa" | "spouse" => Ok(RoleTag::Spouse),
            "amigo" | "amiga" | "friend" => Ok(RoleTag::Friend),
            "familiar" | "family" => Ok(RoleTag::Family),
            "crush" => Ok(RoleTag::Crush),
            "ex" => Ok(RoleTag::Ex),
            "" => Err("role is required".to_string()),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// Severity class of a flag, inferred from its embedded marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagSeverity {
    Red,
    Yellow,
    Green,
}

impl fmt::Display for FlagSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagSeverity::Red => write!(f, "red"),
            FlagSeverity::Yellow => write!(f, "yellow"),
            FlagSeverity::Green => write!(f, "green"),
        }
    }
}

/// A short label classifying a detected communication pattern.
///
/// Serialized as the bare string the backend produced, e.g.
/// `"🚩 Red flag: minimiza tus sentimientos"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagTag(String);

impl FlagTag {
    pub const RED_MARKER: &'static str = "🚩";
    pub const GREEN_MARKER: &'static str = "🟩";
    pub const YELLOW_MARKER: &'static str = "🟨";

    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    /// Red wins over green, green over yellow. Unmarked flags are cautionary.
    pub fn severity(&self) -> FlagSeverity {
        if self.0.contains(Self::RED_MARKER) {
            FlagSeverity::Red
        } else if self.0.contains(Self::GREEN_MARKER) {
            FlagSeverity::Green
        } else {
            FlagSeverity::Yellow
        }
    }
}

impl fmt::Display for FlagTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured relational analysis of a single received message.
///
/// Immutable once produced by the backend. Keys missing from the backend
/// payload default to empty/false; keys with the wrong JSON type are
/// rejected by [`AnalysisResult::from_value`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "contexto", alias = "context_summary", default)]
    pub context_summary: String,
    #[serde(default)]
    pub flags: Vec<FlagTag>,
    #[serde(rename = "abuso_detectado", alias = "abuse_detected", default)]
    pub abuse_detected: bool,
    #[serde(rename = "recomendacion_final", alias = "final_recommendation", default)]
    pub final_recommendation: String,
    #[serde(rename = "sugerencias_respuesta", alias = "suggested_replies", default)]
    pub suggested_replies: Vec<String>,
}

impl AnalysisResult {
    /// Validate an untyped backend payload against the analysis shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ShapeError> {
        if !value.is_object() {
            return Err(ShapeError::NotAnObject("analysis"));
        }
        serde_json::from_value(value).map_err(|e| ShapeError::Malformed {
            what: "analysis",
            reason: e.to_string(),
        })
    }

    pub fn has_red_flags(&self) -> bool {
        self.flags.iter().any(|f| f.severity() == FlagSeverity::Red)
    }

    pub fn has_green_flags(&self) -> bool {
        self.flags.iter().any(|f| f.severity() == FlagSeverity::Green)
    }

    /// Flags of one severity, in backend order.
    pub fn flags_by_severity(&self, severity: FlagSeverity) -> Vec<&FlagTag> {
        self.flags
            .iter()
            .filter(|f| f.severity() == severity)
            .collect()
    }
}
