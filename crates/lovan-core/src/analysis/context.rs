//! Analysis context: holds zero or one active analysis.
//!
//! Activation always replaces the previous analysis wholesale and mints a
//! fresh [`AnalysisId`], so requests issued under the old activation can be
//! told apart from requests issued under the new one.

use tracing::info;

use lovan_types::analysis::{AnalysisResult, RoleTag};
use lovan_types::chat::{ActiveAnalysis, AnalysisId, AnalysisSource};

#[derive(Debug, Default)]
pub struct AnalysisContext {
    active: Option<ActiveAnalysis>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a new analysis active, replacing any previous one.
    pub fn activate(
        &mut self,
        role: RoleTag,
        result: AnalysisResult,
        source: AnalysisSource,
    ) -> &ActiveAnalysis {
        let active = ActiveAnalysis::new(role, result, source);
        info!(analysis_id = %active.id(), role = %role, source = ?active.source(), "Analysis activated");
        self.active.insert(active)
    }

    /// Drop the active analysis, returning it.
    pub fn clear(&mut self) -> Option<ActiveAnalysis> {
        self.active.take()
    }

    pub fn active(&self) -> Option<&ActiveAnalysis> {
        self.active.as_ref()
    }

    /// Whether `id` names the analysis that is active right now.
    pub fn is_current(&self, id: AnalysisId) -> bool {
        self.active.as_ref().is_some_and(|a| a.id() == id)
    }
}
