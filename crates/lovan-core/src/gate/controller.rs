//! The gate controller: one state object, intent methods, read-only views.
//!
//! Network-bound intents come in two halves so that the controller never
//! holds a borrow across a suspended request:
//!
//! - `begin_*` validates, moves the machine into its waiting state, and
//!   returns a ticket tagged with what the request was issued under.
//! - `complete_*` takes the ticket back with the backend's outcome and
//!   applies it, or discards it when the ticket is stale.
//!
//! `submit` and `send_chat` drive both halves against the backend for
//! callers that do not interleave other intents.

use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, info, warn};

use lovan_types::analysis::{AnalysisResult, RoleTag};
use lovan_types::backend::{AnalyzeRequest, ChatRequest, Credentials, SaveTranscriptRequest};
use lovan_types::chat::{ActiveAnalysis, AnalysisId, AnalysisSource, ChatTurn, Speaker};
use lovan_types::error::{BackendError, SessionError};
use lovan_types::history::HistoryRecord;
use lovan_types::identity::{AuthenticatedIdentity, Identity};

use crate::analysis::context::AnalysisContext;
use crate::backend::AnalyzerBackend;
use crate::chat::thread::ConversationThread;
use crate::session::store::{CredentialStore, SessionStore};

use super::state::{ChatGate, GateState};

/// An analysis request that has been issued and not yet completed.
#[derive(Debug)]
pub struct SubmissionTicket {
    seq: u64,
    request: AnalyzeRequest,
}

impl SubmissionTicket {
    pub fn request(&self) -> &AnalyzeRequest {
        &self.request
    }
}

/// What happened to a completed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The result is now the active analysis.
    Activated,
    /// The controller moved on before the response arrived.
    Discarded,
}

/// A chat request that has been issued and not yet completed.
#[derive(Debug)]
pub struct ChatTicket {
    analysis_id: AnalysisId,
    user_ordinal: u64,
    request: ChatRequest,
}

impl ChatTicket {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Activation the request was issued under.
    pub fn analysis_id(&self) -> AnalysisId {
        self.analysis_id
    }

    /// Ordinal of the optimistic user turn.
    pub fn user_ordinal(&self) -> u64 {
        self.user_ordinal
    }
}

/// What happened to a completed chat send.
#[derive(Debug)]
pub enum ChatOutcome {
    /// The model's reply was appended at `ordinal`.
    Replied { ordinal: u64 },
    /// An error turn was appended at `ordinal` in place of a reply.
    Failed { ordinal: u64, error: SessionError },
    /// The analysis changed while the request was in flight.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct PendingTurn {
    pub(super) analysis_id: AnalysisId,
    pub(super) user_ordinal: u64,
}

/// Serializable snapshot for presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerView {
    pub state: GateState,
    pub email: Option<String>,
    pub active: Option<ActiveAnalysis>,
    pub turns: Vec<ChatTurn>,
    pub turn_pending: bool,
}

/// Single writer of the session, the active analysis, and its thread.
pub struct Controller<B: AnalyzerBackend, S: CredentialStore> {
    pub(super) backend: B,
    pub(super) session: SessionStore<S>,
    pub(super) analysis: AnalysisContext,
    pub(super) thread: ConversationThread,
    pub(super) state: GateState,
    pub(super) pending_turn: Option<PendingTurn>,
    pub(super) submission_seq: u64,
    pub(super) deferred_draft: Option<String>,
}

impl<B: AnalyzerBackend, S: CredentialStore> Controller<B, S> {
    /// Create an idle controller around an explicitly constructed session.
    pub fn new(backend: B, session: SessionStore<S>) -> Self {
        Self {
            backend,
            session,
            analysis: AnalysisContext::new(),
            thread: ConversationThread::new(),
            state: GateState::Idle,
            pending_turn: None,
            submission_seq: 0,
            deferred_draft: None,
        }
    }

    // --- Read-only projections ---

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn identity(&self) -> &Identity {
        self.session.identity()
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    pub fn active_analysis(&self) -> Option<&ActiveAnalysis> {
        self.analysis.active()
    }

    pub fn thread(&self) -> &ConversationThread {
        &self.thread
    }

    pub fn is_turn_pending(&self) -> bool {
        self.pending_turn.is_some()
    }

    /// Message kept from the last send that was blocked by the auth gate.
    pub fn deferred_draft(&self) -> Option<&str> {
        self.deferred_draft.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn view(&self) -> ControllerView {
        ControllerView {
            state: self.state,
            email: self.session.identity().email().map(str::to_string),
            active: self.analysis.active().cloned(),
            turns: self.thread.turns().to_vec(),
            turn_pending: self.pending_turn.is_some(),
        }
    }

    // --- Session lifecycle ---

    /// Restore the persisted identity and align the chat gate with it.
    pub async fn restore_session(&mut self) -> &Identity {
        self.session.restore().await;
        self.settle_chat_gate();
        self.session.identity()
    }

    /// Adopt an identity obtained by login.
    ///
    /// A locked chat opens immediately. Failing to persist the identity is
    /// logged; the session stays usable for this run.
    pub async fn authenticate(&mut self, identity: AuthenticatedIdentity) {
        if let Err(err) = self.session.set_authenticated(identity).await {
            warn!("Session is active but was not persisted: {err}");
        }
        self.settle_chat_gate();
    }

    /// Log in through the backend and adopt the issued token.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), SessionError> {
        let credentials = validate_credentials(email, password)?;
        let grant = self.backend.login(&credentials).await?;
        let email = if grant.email.is_empty() {
            credentials.email
        } else {
            grant.email
        };
        let identity = AuthenticatedIdentity::new(grant.subject_id, email, grant.access_token);
        self.authenticate(identity).await;
        Ok(())
    }

    /// Create an account. Registration never logs in.
    pub async fn register(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let credentials = validate_credentials(email, password)?;
        self.backend.register(&credentials).await?;
        info!(email = %credentials.email, "Account registered");
        Ok(())
    }

    /// Forget the identity. An open chat locks again.
    pub async fn logout(&mut self) {
        if let Err(err) = self.session.clear().await {
            warn!("Session cleared in memory but the stored copy remains: {err}");
        }
        self.settle_chat_gate();
    }

    // --- Consent and submission ---

    /// `Idle -> ConsentPending`.
    pub fn request_analysis(&mut self) -> Result<(), SessionError> {
        if self.state != GateState::Idle {
            return Err(self.transition_error("request an analysis"));
        }
        self.transition(GateState::ConsentPending);
        Ok(())
    }

    /// `ConsentPending -> Idle`.
    pub fn cancel_consent(&mut self) -> Result<(), SessionError> {
        if self.state != GateState::ConsentPending {
            return Err(self.transition_error("cancel consent"));
        }
        self.transition(GateState::Idle);
        Ok(())
    }

    /// Accept consent and issue the analysis request.
    ///
    /// Validation failures leave the state untouched and send nothing.
    pub fn begin_submission(
        &mut self,
        role: &str,
        message: &str,
    ) -> Result<SubmissionTicket, SessionError> {
        if self.state != GateState::ConsentPending {
            return Err(self.transition_error("submit an analysis"));
        }
        let role = role.parse::<RoleTag>().map_err(SessionError::Validation)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(SessionError::Validation("message must not be empty".to_string()));
        }

        self.submission_seq += 1;
        self.transition(GateState::SubmissionPending);
        Ok(SubmissionTicket {
            seq: self.submission_seq,
            request: AnalyzeRequest {
                role,
                message: message.to_string(),
            },
        })
    }

    /// Apply the backend's answer to an analysis request.
    ///
    /// On failure the machine returns to `ConsentPending` and no analysis is
    /// created.
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<AnalysisResult, BackendError>,
    ) -> Result<SubmissionOutcome, SessionError> {
        if self.state != GateState::SubmissionPending || ticket.seq != self.submission_seq {
            debug!(seq = ticket.seq, "Discarding stale analysis response");
            return Ok(SubmissionOutcome::Discarded);
        }

        match outcome {
            Ok(result) => {
                self.thread.clear();
                self.pending_turn = None;
                self.deferred_draft = None;
                self.analysis
                    .activate(ticket.request.role, result, AnalysisSource::Fresh);
                let gate = ChatGate::for_session(self.session.is_authenticated());
                self.transition(GateState::Results(gate));
                Ok(SubmissionOutcome::Activated)
            }
            Err(err) => {
                warn!("Analysis failed: {err}");
                self.transition(GateState::ConsentPending);
                Err(err.into())
            }
        }
    }

    /// Accept consent, call the backend, and apply the result.
    pub async fn submit(
        &mut self,
        role: &str,
        message: &str,
    ) -> Result<SubmissionOutcome, SessionError> {
        let ticket = self.begin_submission(role, message)?;
        let outcome = self
            .backend
            .analyze(ticket.request(), self.session.token())
            .await;
        self.complete_submission(ticket, outcome)
    }

    /// `* -> Idle`: drop the analysis and its thread.
    ///
    /// A reply still in flight for the dropped analysis will be discarded.
    pub fn new_analysis(&mut self) {
        if let Some(active) = self.analysis.clear() {
            info!(analysis_id = %active.id(), "Analysis dropped");
        }
        self.thread.clear();
        self.pending_turn = None;
        self.deferred_draft = None;
        self.transition(GateState::Idle);
    }

    // --- Follow-up chat ---

    /// Record the user's turn and issue the chat request.
    ///
    /// Anonymous sends fail with `AuthRequired` without touching the thread;
    /// the message is kept as the deferred draft.
    pub fn begin_chat(&mut self, text: &str) -> Result<ChatTicket, SessionError> {
        let Some(active) = self.analysis.active() else {
            return Err(SessionError::NoActiveAnalysis);
        };
        let message = text.trim();
        if message.is_empty() {
            return Err(SessionError::Validation("message must not be empty".to_string()));
        }

        match self.state {
            GateState::Results(ChatGate::ChatActive) if self.session.is_authenticated() => {}
            GateState::Results(_) => {
                info!("Chat send blocked until the user authenticates");
                self.deferred_draft = Some(message.to_string());
                return Err(SessionError::AuthRequired);
            }
            _ => return Err(self.transition_error("send a chat message")),
        }

        if self.pending_turn.is_some() {
            return Err(SessionError::TurnPending);
        }

        let request = ChatRequest {
            role: active.role(),
            message: message.to_string(),
            history: self.thread.build_context_payload(active),
        };
        let analysis_id = active.id();
        let user_ordinal = self.thread.append(Speaker::User, message);

        self.deferred_draft = None;
        self.pending_turn = Some(PendingTurn {
            analysis_id,
            user_ordinal,
        });
        debug!(%analysis_id, user_ordinal, "Chat turn pending");

        Ok(ChatTicket {
            analysis_id,
            user_ordinal,
            request,
        })
    }

    /// Apply the backend's answer to a chat request.
    ///
    /// Replies for an analysis that is no longer active are dropped. Failures
    /// become a visible error turn; the user's turn always stays.
    pub fn complete_chat(
        &mut self,
        ticket: ChatTicket,
        outcome: Result<String, BackendError>,
    ) -> ChatOutcome {
        let matches_pending = self.pending_turn.is_some_and(|p| {
            p.analysis_id == ticket.analysis_id && p.user_ordinal == ticket.user_ordinal
        });
        if !self.analysis.is_current(ticket.analysis_id) || !matches_pending {
            info!(
                analysis_id = %ticket.analysis_id,
                "Discarding chat reply for an analysis that is no longer active"
            );
            return ChatOutcome::Discarded;
        }
        self.pending_turn = None;

        match outcome {
            Ok(reply) => {
                let ordinal = self.thread.append(Speaker::Model, reply);
                ChatOutcome::Replied { ordinal }
            }
            Err(err) => {
                warn!("Chat turn failed: {err}");
                let ordinal = self.thread.append_error(failure_marker(&err));
                ChatOutcome::Failed {
                    ordinal,
                    error: err.into(),
                }
            }
        }
    }

    /// Send one follow-up message and wait for the reply.
    pub async fn send_chat(&mut self, text: &str) -> Result<ChatOutcome, SessionError> {
        let ticket = self.begin_chat(text)?;
        let outcome = match self.session.token() {
            Some(token) => self.backend.chat(ticket.request(), token).await,
            None => Err(BackendError::Unauthorized(
                "session ended before the request was sent".to_string(),
            )),
        };
        Ok(self.complete_chat(ticket, outcome))
    }

    /// Hand back the message blocked by the auth gate, if any.
    pub fn take_deferred_draft(&mut self) -> Option<String> {
        self.deferred_draft.take()
    }

    // --- History ---

    /// Saved analyses of the logged-in user, newest first.
    pub async fn fetch_history(&self) -> Result<Vec<HistoryRecord>, SessionError> {
        let token = self.session.token().ok_or(SessionError::AuthRequired)?;
        let records = self.backend.fetch_history(token).await?;
        info!(count = records.len(), "History fetched");
        Ok(records)
    }

    /// Save the current thread into the resumed history record.
    ///
    /// Only resumed analyses have a server-side record to update.
    pub async fn persist_transcript(&self) -> Result<usize, SessionError> {
        let token = self.session.token().ok_or(SessionError::AuthRequired)?;
        let active = self.analysis.active().ok_or(SessionError::NoActiveAnalysis)?;
        let record_id = active.record_id().ok_or(SessionError::NotResumable)?;
        if self.pending_turn.is_some() {
            return Err(SessionError::TurnPending);
        }

        let request = SaveTranscriptRequest {
            analysis_id: record_id.clone(),
            chat_history: self.thread.turns().to_vec(),
        };
        self.backend.save_transcript(&request, token).await?;
        info!(record_id = %record_id, turns = request.chat_history.len(), "Transcript saved");
        Ok(request.chat_history.len())
    }

    // --- Internals ---

    pub(super) fn transition(&mut self, next: GateState) {
        if self.state != next {
            info!(from = %self.state, to = %next, "Gate transition");
            self.state = next;
        }
    }

    /// Open or lock the chat to match the session.
    pub(super) fn settle_chat_gate(&mut self) {
        if let GateState::Results(_) = self.state {
            let gate = ChatGate::for_session(self.session.is_authenticated());
            self.transition(GateState::Results(gate));
        }
    }

    fn transition_error(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.state.to_string(),
            action,
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<Credentials, SessionError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(SessionError::Validation("email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(SessionError::Validation("password is required".to_string()));
    }
    Ok(Credentials {
        email: email.to_string(),
        password: SecretString::from(password.to_string()),
    })
}

/// Text shown in the error turn that replaces a failed reply.
fn failure_marker(err: &BackendError) -> String {
    match err {
        BackendError::Network(_) => "⚠️ Error de conexión. Intenta de nuevo.".to_string(),
        BackendError::Rejected(msg) | BackendError::Unauthorized(msg) if !msg.trim().is_empty() => {
            format!("⚠️ Error: {msg}")
        }
        _ => "⚠️ Error: No se pudo procesar tu mensaje.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    use lovan_types::analysis::RoleTag;

    fn grant(email: &str, token: &str) -> lovan_types::backend::AuthGrant {
        lovan_types::backend::AuthGrant {
            subject_id: Some("u-2".to_string()),
            email: email.to_string(),
            access_token: SecretString::from(token.to_string()),
        }
    }

    #[test]
    fn test_request_analysis_only_from_idle() {
        let mut controller = anonymous_controller();
        controller.request_analysis().unwrap();
        assert_eq!(controller.state(), GateState::ConsentPending);

        let err = controller.request_analysis().unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(err.to_string(), "cannot request an analysis while awaiting consent");
    }

    #[test]
    fn test_cancel_consent_returns_to_idle() {
        let mut controller = anonymous_controller();
        assert!(controller.cancel_consent().is_err());
        controller.request_analysis().unwrap();
        controller.cancel_consent().unwrap();
        assert_eq!(controller.state(), GateState::Idle);
    }

    #[test]
    fn test_submission_requires_consent() {
        let mut controller = anonymous_controller();
        let err = controller.begin_submission("ex", "hola").unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(controller.state(), GateState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_submission_sends_nothing() {
        let mut controller = anonymous_controller();
        controller.request_analysis().unwrap();

        let err = controller.submit("ex", "   ").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        let err = controller.submit("", "hola").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        let err = controller.submit("jefe", "hola").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));

        assert_eq!(controller.state(), GateState::ConsentPending);
        assert!(controller.backend().analyze_tokens().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_submission_locks_chat() {
        let mut controller = anonymous_controller();
        analyzed(&mut controller, "ex", "Reproche").await;

        assert_eq!(
            controller.state(),
            GateState::Results(ChatGate::ChatLockedForAnon)
        );
        let active = controller.active_analysis().unwrap();
        assert_eq!(active.role(), RoleTag::Ex);
        assert_eq!(active.source(), &AnalysisSource::Fresh);
        assert_eq!(controller.backend().analyze_tokens(), vec![None]);
    }

    #[tokio::test]
    async fn test_authenticated_submission_sends_token() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "pareja", "Celos").await;

        assert_eq!(controller.state(), GateState::Results(ChatGate::ChatActive));
        assert_eq!(
            controller.backend().analyze_tokens(),
            vec![Some("tok-ana".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_submission_returns_to_consent() {
        let mut controller = anonymous_controller();
        controller.request_analysis().unwrap();
        controller
            .backend()
            .push_analysis(Err(BackendError::Network("timeout".to_string())));

        let err = controller.submit("ex", "hola").await.unwrap_err();
        assert!(matches!(err, SessionError::Network(_)));
        assert_eq!(controller.state(), GateState::ConsentPending);
        assert!(controller.active_analysis().is_none());
    }

    #[tokio::test]
    async fn test_rejected_submission_surfaces_backend_message() {
        let mut controller = anonymous_controller();
        controller.request_analysis().unwrap();
        controller
            .backend()
            .push_analysis(Err(BackendError::Rejected("Rol inválido".to_string())));

        let err = controller.submit("ex", "hola").await.unwrap_err();
        assert!(matches!(err, SessionError::BackendRejected(msg) if msg == "Rol inválido"));
    }

    #[test]
    fn test_stale_submission_is_discarded() {
        let mut controller = anonymous_controller();
        controller.request_analysis().unwrap();
        let ticket = controller.begin_submission("ex", "hola").unwrap();
        assert_eq!(controller.state(), GateState::SubmissionPending);

        controller.new_analysis();
        let outcome = controller
            .complete_submission(ticket, Ok(sample_result("tarde")))
            .unwrap();
        assert_eq!(outcome, SubmissionOutcome::Discarded);
        assert_eq!(controller.state(), GateState::Idle);
        assert!(controller.active_analysis().is_none());
    }

    #[test]
    fn test_superseded_submission_is_discarded() {
        let mut controller = anonymous_controller();
        controller.request_analysis().unwrap();
        let first = controller.begin_submission("ex", "uno").unwrap();
        controller.new_analysis();
        controller.request_analysis().unwrap();
        let second = controller.begin_submission("amigo", "dos").unwrap();

        let outcome = controller
            .complete_submission(first, Ok(sample_result("uno")))
            .unwrap();
        assert_eq!(outcome, SubmissionOutcome::Discarded);

        let outcome = controller
            .complete_submission(second, Ok(sample_result("dos")))
            .unwrap();
        assert_eq!(outcome, SubmissionOutcome::Activated);
        assert_eq!(controller.active_analysis().unwrap().role(), RoleTag::Friend);
    }

    #[tokio::test]
    async fn test_anonymous_chat_is_gated() {
        let mut controller = anonymous_controller();
        analyzed(&mut controller, "ex", "Reproche").await;

        let err = controller.send_chat("¿es grave?").await.unwrap_err();
        assert!(matches!(err, SessionError::AuthRequired));
        assert!(controller.thread().is_empty());
        assert!(controller.backend().chat_requests().is_empty());
        assert_eq!(controller.deferred_draft(), Some("¿es grave?"));
    }

    #[tokio::test]
    async fn test_login_unlocks_chat_without_reanalysis() {
        let mut controller = anonymous_controller();
        analyzed(&mut controller, "ex", "Reproche").await;
        let analysis_id = controller.active_analysis().unwrap().id();
        let _ = controller.send_chat("¿es grave?").await;

        controller
            .backend()
            .push_grant(Ok(grant("ana@example.com", "tok-new")));
        controller.login("ana@example.com", "secreto").await.unwrap();

        assert_eq!(controller.state(), GateState::Results(ChatGate::ChatActive));
        assert_eq!(controller.active_analysis().unwrap().id(), analysis_id);
        assert_eq!(controller.backend().analyze_tokens().len(), 1);
        assert!(controller.session().store().blob().unwrap().contains("tok-new"));

        let draft = controller.take_deferred_draft().unwrap();
        controller.backend().push_reply(Ok("Depende del contexto.".to_string()));
        let outcome = controller.send_chat(&draft).await.unwrap();
        assert!(matches!(outcome, ChatOutcome::Replied { ordinal: 1 }));
    }

    #[tokio::test]
    async fn test_chat_round_trip_in_spanish() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche por falta de respuesta").await;
        controller
            .backend()
            .push_reply(Ok("No necesariamente; parece un reclamo.".to_string()));

        let outcome = controller.send_chat("  ¿es grave?  ").await.unwrap();
        assert!(matches!(outcome, ChatOutcome::Replied { ordinal: 1 }));

        let turns = controller.thread().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker, Speaker::User);
        assert_eq!(turns[0].text, "¿es grave?");
        assert_eq!(turns[1].speaker, Speaker::Model);

        let request = &controller.backend().chat_requests()[0];
        assert_eq!(request.role, RoleTag::Ex);
        assert_eq!(request.message, "¿es grave?");
        assert_eq!(request.history.len(), 1);
        assert!(request.history[0].text.contains("rol: ex"));
        assert!(request.history[0].text.contains("Reproche por falta de respuesta"));
    }

    #[tokio::test]
    async fn test_second_send_while_pending_is_rejected() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche").await;

        let ticket = controller.begin_chat("primero").unwrap();
        assert!(controller.is_turn_pending());
        let err = controller.begin_chat("segundo").unwrap_err();
        assert!(matches!(err, SessionError::TurnPending));
        assert_eq!(controller.thread().len(), 1);

        controller.complete_chat(ticket, Ok("ok".to_string()));
        assert!(!controller.is_turn_pending());
        assert!(controller.begin_chat("segundo").is_ok());
    }

    #[tokio::test]
    async fn test_blank_chat_message_is_rejected() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche").await;
        let err = controller.send_chat(" \n\t ").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert!(controller.thread().is_empty());
    }

    #[tokio::test]
    async fn test_chat_without_analysis() {
        let mut controller = authenticated_controller().await;
        let err = controller.send_chat("hola").await.unwrap_err();
        assert!(matches!(err, SessionError::NoActiveAnalysis));
    }

    #[tokio::test]
    async fn test_network_failure_appends_error_turn() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche").await;
        controller
            .backend()
            .push_reply(Err(BackendError::Network("connection refused".to_string())));

        let outcome = controller.send_chat("¿es grave?").await.unwrap();
        let ChatOutcome::Failed { ordinal, error } = outcome else {
            panic!("expected a failed turn");
        };
        assert_eq!(ordinal, 1);
        assert!(matches!(error, SessionError::Network(_)));

        let turns = controller.thread().turns();
        assert_eq!(turns[0].text, "¿es grave?");
        assert!(turns[1].is_error);
        assert_eq!(turns[1].text, "⚠️ Error de conexión. Intenta de nuevo.");
        assert!(!controller.is_turn_pending());

        controller.backend().push_reply(Ok("Ahora sí.".to_string()));
        controller.send_chat("¿y ahora?").await.unwrap();
        let request = &controller.backend().chat_requests()[1];
        assert_eq!(request.history.len(), 3);
        assert_eq!(request.history[1].text, "¿es grave?");
        assert_eq!(request.history[2].role, Speaker::Model);
        assert_eq!(request.history[2].text, "⚠️ Error de conexión. Intenta de nuevo.");
    }

    #[tokio::test]
    async fn test_rejected_chat_shows_backend_message() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche").await;
        controller
            .backend()
            .push_reply(Err(BackendError::Rejected("Mensaje muy largo".to_string())));

        controller.send_chat("hola").await.unwrap();
        assert_eq!(
            controller.thread().turns()[1].text,
            "⚠️ Error: Mensaje muy largo"
        );
    }

    #[tokio::test]
    async fn test_reply_after_new_analysis_is_discarded() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche").await;
        let ticket = controller.begin_chat("¿es grave?").unwrap();

        analyzed(&mut controller, "amigo", "Broma").await;
        let outcome = controller.complete_chat(ticket, Ok("respuesta vieja".to_string()));

        assert!(matches!(outcome, ChatOutcome::Discarded));
        assert!(controller.thread().is_empty());
        assert!(!controller.is_turn_pending());
    }

    #[tokio::test]
    async fn test_new_analysis_clears_thread() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche").await;
        controller.backend().push_reply(Ok("ok".to_string()));
        controller.send_chat("hola").await.unwrap();

        controller.new_analysis();
        assert_eq!(controller.state(), GateState::Idle);
        assert!(controller.active_analysis().is_none());
        assert!(controller.thread().is_empty());
    }

    #[tokio::test]
    async fn test_logout_relocks_chat() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche").await;

        controller.logout().await;
        assert_eq!(
            controller.state(),
            GateState::Results(ChatGate::ChatLockedForAnon)
        );
        assert!(controller.session().store().blob().is_none());
        assert!(controller.active_analysis().is_some());
    }

    #[tokio::test]
    async fn test_login_validation() {
        let mut controller = anonymous_controller();
        let err = controller.login("  ", "x").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        let err = controller.login("a@b.c", "").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_failed_login_stays_anonymous() {
        let mut controller = anonymous_controller();
        controller
            .backend()
            .push_grant(Err(BackendError::Rejected("Credenciales inválidas".to_string())));

        let err = controller.login("a@b.c", "mala").await.unwrap_err();
        assert!(matches!(err, SessionError::BackendRejected(msg) if msg == "Credenciales inválidas"));
        assert!(!controller.identity().is_authenticated());
        assert!(controller.session().store().blob().is_none());
    }

    #[tokio::test]
    async fn test_login_falls_back_to_entered_email() {
        let mut controller = anonymous_controller();
        controller.backend().push_grant(Ok(grant("", "tok")));
        controller.login(" ana@example.com ", "secreto").await.unwrap();
        assert_eq!(controller.identity().email(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn test_register_does_not_log_in() {
        let controller = anonymous_controller();
        controller.register("nuevo@example.com", "secreto").await.unwrap();
        assert_eq!(controller.backend().registrations(), vec!["nuevo@example.com"]);
        assert!(!controller.identity().is_authenticated());
    }

    #[tokio::test]
    async fn test_history_requires_auth() {
        let controller = anonymous_controller();
        let err = controller.fetch_history().await.unwrap_err();
        assert!(matches!(err, SessionError::AuthRequired));
    }

    #[tokio::test]
    async fn test_persist_transcript_of_fresh_analysis() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "ex", "Reproche").await;
        let err = controller.persist_transcript().await.unwrap_err();
        assert!(matches!(err, SessionError::NotResumable));
    }

    #[tokio::test]
    async fn test_persist_transcript_of_resumed_analysis() {
        let mut controller = authenticated_controller().await;
        controller.resume(&history_record("17", RoleTag::Ex, vec![]));
        controller.backend().push_reply(Ok("Claro.".to_string()));
        controller.send_chat("¿me ayudas?").await.unwrap();

        let saved = controller.persist_transcript().await.unwrap();
        assert_eq!(saved, 2);
        let request = &controller.backend().saved()[0];
        assert_eq!(request.analysis_id.as_str(), "17");
        assert_eq!(request.chat_history[1].text, "Claro.");
    }

    #[tokio::test]
    async fn test_persist_transcript_requires_auth() {
        let mut controller = anonymous_controller();
        controller.resume(&history_record("17", RoleTag::Ex, vec![]));
        let err = controller.persist_transcript().await.unwrap_err();
        assert!(matches!(err, SessionError::AuthRequired));
    }

    #[tokio::test]
    async fn test_restore_session_from_stored_blob() {
        let store = crate::session::memory::MemoryCredentialStore::with_blob(
            r#"{"id":"u-1","email":"ana@example.com","access_token":"tok"}"#,
        );
        let mut controller = Controller::new(ScriptedBackend::new(), SessionStore::new(store));
        let identity = controller.restore_session().await;
        assert_eq!(identity.email(), Some("ana@example.com"));
        assert_eq!(controller.view().email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn test_view_snapshot() {
        let mut controller = authenticated_controller().await;
        analyzed(&mut controller, "crush", "Coqueteo").await;
        let _ticket = controller.begin_chat("¿le gusto?").unwrap();

        let view = controller.view();
        assert_eq!(view.state, GateState::Results(ChatGate::ChatActive));
        assert_eq!(view.turns.len(), 1);
        assert!(view.turn_pending);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"]["state"], "results");
        assert_eq!(json["active"]["role"], "crush");
    }
}
