//! Gate states.
//!
//! ```text
//! Idle -> ConsentPending -> SubmissionPending -> Results(ChatLockedForAnon | ChatActive)
//!   ^          |                  |  (failure)           |
//!   |          +-- cancel --------+-> ConsentPending     |
//!   +------------------------- new analysis -------------+
//! any state -- resume --> Results(..)
//! ```

use serde::Serialize;

use std::fmt;

/// Whether chat is usable while results are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatGate {
    /// Anonymous: sends are rejected with `AuthRequired`.
    ChatLockedForAnon,
    ChatActive,
}

impl ChatGate {
    /// Gate for the given authentication status.
    pub fn for_session(authenticated: bool) -> Self {
        if authenticated {
            ChatGate::ChatActive
        } else {
            ChatGate::ChatLockedForAnon
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "chat", rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Idle,
    ConsentPending,
    SubmissionPending,
    /// An analysis is shown; the chat gate follows the session.
    Results(ChatGate),
}

impl GateState {
    pub fn is_results(&self) -> bool {
        matches!(self, GateState::Results(_))
    }

    pub fn chat_gate(&self) -> Option<ChatGate> {
        match self {
            GateState::Results(gate) => Some(*gate),
            _ => None,
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateState::Idle => write!(f, "idle"),
            GateState::ConsentPending => write!(f, "awaiting consent"),
            GateState::SubmissionPending => write!(f, "submitting"),
            GateState::Results(ChatGate::ChatLockedForAnon) => {
                write!(f, "showing results (chat locked)")
            }
            GateState::Results(ChatGate::ChatActive) => write!(f, "chatting"),
        }
    }
}
