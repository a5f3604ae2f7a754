//! Resuming a saved analysis from history.

use tracing::info;

use lovan_types::chat::{ActiveAnalysis, AnalysisSource};
use lovan_types::error::SessionError;
use lovan_types::history::HistoryRecord;

use crate::backend::AnalyzerBackend;
use crate::session::store::CredentialStore;

use super::controller::Controller;
use super::state::{ChatGate, GateState};

impl<B: AnalyzerBackend, S: CredentialStore> Controller<B, S> {
    /// Make `record` the active analysis and restore its transcript.
    ///
    /// Allowed from any state. Work pending for the previous analysis is
    /// orphaned and its response will be discarded. Resuming the same record
    /// twice leaves the same thread behind.
    pub fn resume(&mut self, record: &HistoryRecord) -> &ActiveAnalysis {
        if let Some(pending) = self.pending_turn.take() {
            info!(
                analysis_id = %pending.analysis_id,
                "Pending chat turn orphaned by resume"
            );
        }
        self.deferred_draft = None;
        self.thread.replace(record.chat_history.clone());

        let gate = ChatGate::for_session(self.session.is_authenticated());
        self.transition(GateState::Results(gate));
        info!(
            record_id = %record.id,
            turns = self.thread.len(),
            "Resumed saved analysis"
        );

        self.analysis.activate(
            record.role,
            record.result.clone(),
            AnalysisSource::Resumed(record.id.clone()),
        )
    }

    /// Fetch history and resume the record with the given id.
    pub async fn resume_by_id(&mut self, id: &str) -> Result<&ActiveAnalysis, SessionError> {
        let records = self.fetch_history().await?;
        let record = records
            .into_iter()
            .find(|r| r.id.as_str() == id)
            .ok_or_else(|| SessionError::Validation(format!("no saved analysis with id '{id}'")))?;
        Ok(self.resume(&record))
    }
}

#[cfg(test)]
mod tests {
    use lovan_types::analysis::RoleTag;
    use lovan_types::chat::{ChatTurn, Speaker};
    use lovan_types::error::SessionError;

    use crate::gate::controller::ChatOutcome;
    use crate::gate::state::{ChatGate, GateState};
    use crate::testing::*;

    fn saved_turns() -> Vec<ChatTurn> {
        vec![
            ChatTurn::new(Speaker::User, "¿es grave?", 0),
            ChatTurn::new(Speaker::Model, "No necesariamente.", 1),
        ]
    }

    #[tokio::test]
    async fn test_resume_restores_transcript_and_source() {
        let mut controller = authenticated_controller().await;
        let record = history_record("17", RoleTag::Ex, saved_turns());

        let active = controller.resume(&record);
        assert_eq!(active.role(), RoleTag::Ex);
        assert_eq!(active.record_id().map(|r| r.as_str()), Some("17"));

        assert_eq!(controller.state(), GateState::Results(ChatGate::ChatActive));
        assert_eq!(controller.thread().turns(), saved_turns().as_slice());
        assert_eq!(controller.thread().next_ordinal(), 2);
    }

    #[tokio::test]
    async fn test_resume_is_idempotent() {
        let mut controller = authenticated_controller().await;
        let record = history_record("17", RoleTag::Ex, saved_turns());

        controller.resume(&record);
        let first = controller.view();
        controller.resume(&record);
        let second = controller.view();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
        assert_eq!(first.turns.len(), 2);
        assert!(second.active.is_some());
    }

    #[tokio::test]
    async fn test_resume_while_anonymous_locks_chat() {
        let mut controller = anonymous_controller();
        controller.resume(&history_record("3", RoleTag::Friend, vec![]));
        assert_eq!(
            controller.state(),
            GateState::Results(ChatGate::ChatLockedForAnon)
        );
    }

    #[tokio::test]
    async fn test_resume_from_consent_pending() {
        let mut controller = authenticated_controller().await;
        controller.request_analysis().unwrap();
        controller.resume(&history_record("3", RoleTag::Family, vec![]));
        assert!(controller.state().is_results());
    }

    #[tokio::test]
    async fn test_resume_discards_in_flight_reply() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche").await;

        let ticket = controller.begin_chat("¿qué hago?").unwrap();
        controller.resume(&history_record("17", RoleTag::Ex, saved_turns()));
        assert!(!controller.is_turn_pending());

        let outcome = controller.complete_chat(ticket, Ok("respuesta tardía".to_string()));
        assert!(matches!(outcome, ChatOutcome::Discarded));
        assert_eq!(controller.thread().turns(), saved_turns().as_slice());
    }

    #[tokio::test]
    async fn test_chat_after_resume_continues_ordinals() {
        let mut controller = authenticated_controller().await;
        controller.resume(&history_record("17", RoleTag::Ex, saved_turns()));
        controller.backend().push_reply(Ok("Puedes decirle cómo te sientes.".to_string()));

        let outcome = controller.send_chat("¿y ahora?").await.unwrap();
        assert!(matches!(outcome, ChatOutcome::Replied { ordinal: 3 }));

        let request = &controller.backend().chat_requests()[0];
        assert_eq!(request.history.len(), 3);
        assert!(request.history[0].text.contains("contexto 17"));
        assert_eq!(request.history[2].text, "No necesariamente.");
    }

    #[tokio::test]
    async fn test_resume_by_id_fetches_history() {
        let mut controller = authenticated_controller().await;
        controller.backend().set_history(vec![
            history_record("18", RoleTag::Crush, vec![]),
            history_record("17", RoleTag::Ex, saved_turns()),
        ]);

        let active = controller.resume_by_id("17").await.unwrap();
        assert_eq!(active.role(), RoleTag::Ex);

        let err = controller.resume_by_id("99").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resume_by_id_requires_auth() {
        let mut controller = anonymous_controller();
        let err = controller.resume_by_id("17").await.unwrap_err();
        assert!(matches!(err, SessionError::AuthRequired));
    }
}
