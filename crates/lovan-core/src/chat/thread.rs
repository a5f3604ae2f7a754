//! Conversation thread bound to the active analysis.
//!
//! Ordinals are assigned as `max(existing) + 1` (0 for an empty thread) and
//! are the only ordering key. The backend keeps no session state, so every
//! chat request carries a context payload rebuilt from the current analysis
//! and the turns recorded so far.

use tracing::{debug, warn};

use lovan_types::chat::{ActiveAnalysis, ChatTurn, ContextEntry, Speaker};

/// Prefix of the synthetic entry that opens every context payload.
const PREAMBLE_PREFIX: &str = "[Análisis previo]";

/// Ordered chat turns for one active analysis.
#[derive(Debug, Clone, Default)]
pub struct ConversationThread {
    turns: Vec<ChatTurn>,
}

impl ConversationThread {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordinal the next appended turn will get.
    pub fn next_ordinal(&self) -> u64 {
        self.turns
            .iter()
            .map(|t| t.ordinal)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Append a turn and return its ordinal.
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) -> u64 {
        let ordinal = self.next_ordinal();
        self.turns.push(ChatTurn::new(speaker, text, ordinal));
        ordinal
    }

    /// Append a synthetic model turn reporting a failed request.
    pub fn append_error(&mut self, marker: impl Into<String>) -> u64 {
        let ordinal = self.next_ordinal();
        self.turns.push(ChatTurn::error(marker, ordinal));
        ordinal
    }

    /// Replace every turn with `turns`, keeping their ordinals.
    ///
    /// Turns are ordered by ordinal (stable, so turns sharing an ordinal keep
    /// their saved order). Nothing is dropped; repeated ordinals are logged.
    pub fn replace(&mut self, mut turns: Vec<ChatTurn>) {
        turns.sort_by_key(|t| t.ordinal);
        let repeated = turns
            .windows(2)
            .filter(|pair| pair[0].ordinal == pair[1].ordinal)
            .count();
        if repeated > 0 {
            warn!(
                repeated,
                turns = turns.len(),
                "Restored transcript repeats ordinals; keeping every turn"
            );
        }
        self.turns = turns;
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Build the history sent with a chat request.
    ///
    /// Starts with a preamble summarizing `active` (regenerated on every call),
    /// followed by every recorded turn in ordinal order, error turns included.
    pub fn build_context_payload(&self, active: &ActiveAnalysis) -> Vec<ContextEntry> {
        let mut payload = Vec::with_capacity(self.turns.len() + 1);
        payload.push(analysis_preamble(active));
        payload.extend(self.turns.iter().map(ContextEntry::from));

        debug!(
            analysis_id = %active.id(),
            entries = payload.len(),
            "Built chat context payload"
        );
        payload
    }
}

/// Synthetic user entry describing the analysis the chat is about.
pub fn analysis_preamble(active: &ActiveAnalysis) -> ContextEntry {
    let result_json = serde_json::to_string(active.result()).unwrap_or_default();
    ContextEntry {
        role: Speaker::User,
        text: format!(
            "{PREAMBLE_PREFIX} Mensaje original analizado (rol: {}). Resultado del análisis: {result_json}",
            active.role()
        ),
    }
}
