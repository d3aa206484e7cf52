//! Session controller: the Create/Chat state machine.
//!
//! ## Transitions
//! - `Create --create(no thread id)--> Chat` with a fresh session
//! - `Create --create(thread id)--> Chat` once the history fetch succeeds;
//!   on failure the controller stays in `Create`
//! - `Chat --back--> Create`, discarding the session
//! - `Chat --send--> Chat`: loading on, optimistic user append, one exchange,
//!   reconcile, loading off
//!
//! Only one exchange may be in flight. A second send while `loading` is set is
//! rejected outright, never queued. Failures become [`Notice`]s; nothing here
//! is fatal, and the optimistic user message is never rolled back.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SessionError, TransportError};
use crate::protocol::{InboundEvent, Message, OutboundEnvelope};
use crate::reconcile::reconcile;
use crate::store::ConversationSession;
use crate::transport::Transport;

pub const NO_RESPONSE_NOTICE: &str = "No response received from WhoaAI. You can resend your message.";
pub const RESUME_FAILED_NOTICE: &str =
    "Failed to load existing conversation. Please check the thread ID.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message for the user, drained by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Notice { level, text: text.into() }
    }
}

/// The create form, as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateForm {
    pub job_title: String,
    pub thread_id: Option<String>,
    pub auth_token: Option<String>,
}

impl CreateForm {
    pub fn new(job_title: impl Into<String>) -> Self {
        CreateForm { job_title: job_title.into(), ..Default::default() }
    }

    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
    Create,
    Chat(ConversationSession),
}

/// An exchange that has been started by [`SessionController::begin_send`]
/// and not yet completed. Bound to the session that started it.
#[derive(Debug)]
pub struct PendingExchange {
    pub session_id: Uuid,
    pub envelope: OutboundEnvelope,
    pub token: Option<String>,
}

/// How a send ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// An assistant message was appended.
    Replied,
    /// The reply only updated state (e.g. a connection acknowledgement).
    Silent,
    /// Nothing arrived before the timeout.
    NoResponse,
    /// The exchange failed; a notice was queued.
    Failed,
    /// The session that started the exchange is gone; the result was dropped.
    Stale,
}

pub struct SessionController<T: Transport> {
    transport: T,
    state: UiState,
    notices: Vec<Notice>,
}

impl<T: Transport> SessionController<T> {
    pub fn new(transport: T) -> Self {
        SessionController { transport, state: UiState::Create, notices: Vec::new() }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn is_chat(&self) -> bool {
        matches!(self.state, UiState::Chat(_))
    }

    pub fn session(&self) -> Option<&ConversationSession> {
        match &self.state {
            UiState::Chat(session) => Some(session),
            UiState::Create => None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Drain queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice::new(level, text));
    }

    fn session_mut(&mut self) -> Result<&mut ConversationSession, SessionError> {
        match &mut self.state {
            UiState::Chat(session) => Ok(session),
            UiState::Create => Err(SessionError::NotInChat),
        }
    }

    /// Submit the create form: start a new conversation, or resume one when
    /// a thread id is given.
    pub async fn create(&mut self, form: CreateForm) -> Result<(), SessionError> {
        if self.is_chat() {
            return Err(SessionError::NotInCreate);
        }
        let job_title = form.job_title;
        if job_title.trim().is_empty() {
            self.notify(NoticeLevel::Error, "Job title is required.");
            return Err(SessionError::MissingJobTitle);
        }
        let token = form.auth_token.filter(|t| !t.is_empty());
        let thread_id = form.thread_id.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

        let session = match thread_id {
            None => {
                info!(job_title = %job_title, "starting new conversation");
                ConversationSession::fresh(job_title, token)
            }
            Some(thread_id) => {
                match self.transport.fetch_history(&thread_id, token.as_deref()).await {
                    Ok(history) => {
                        info!(
                            thread_id = %thread_id,
                            messages = history.messages.len(),
                            "resuming conversation"
                        );
                        ConversationSession::resumed(job_title, token, thread_id, history)
                    }
                    Err(e) => {
                        warn!(thread_id = %thread_id, error = %e, "history fetch failed");
                        self.notify(NoticeLevel::Error, history_failure_text(&e));
                        self.notify(NoticeLevel::Error, RESUME_FAILED_NOTICE);
                        return Err(SessionError::History(e));
                    }
                }
            }
        };

        self.state = UiState::Chat(session);
        Ok(())
    }

    /// Leave the chat. The session is discarded.
    pub fn back(&mut self) {
        if self.is_chat() {
            info!("leaving conversation");
            self.state = UiState::Create;
        }
    }

    /// First half of a send: validate, mark loading, and append the user's
    /// message before any network activity.
    pub fn begin_send(&mut self, input: &str) -> Result<PendingExchange, SessionError> {
        let session = self.session_mut()?;
        if session.is_loading() {
            debug!("send rejected, exchange already in flight");
            return Err(SessionError::Busy);
        }
        let content = input.trim();
        if content.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        session.set_loading(true);
        session.append_message(Message::user(content));
        let envelope =
            OutboundEnvelope::user_message(session.job_title(), content, session.thread_id());
        let token = session.auth_token().map(str::to_string);
        Ok(PendingExchange { session_id: session.id(), envelope, token })
    }

    /// Second half of a send: apply the result and clear `loading`.
    ///
    /// A result for a session other than the current one (the user went back,
    /// and possibly started another conversation) is dropped without touching
    /// the current session.
    pub fn complete_send(
        &mut self,
        pending: PendingExchange,
        result: Result<InboundEvent, TransportError>,
    ) -> SendOutcome {
        let (outcome, notice) = match &mut self.state {
            UiState::Chat(session) if session.id() == pending.session_id => {
                let outcome = match result {
                    Ok(InboundEvent::Empty) => (SendOutcome::NoResponse, None),
                    Ok(event) => {
                        let delta = reconcile(event);
                        let appended = delta.append.is_some();
                        session.apply(delta);
                        if appended {
                            (SendOutcome::Replied, None)
                        } else {
                            (SendOutcome::Silent, None)
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "message exchange failed");
                        (SendOutcome::Failed, Some(format!("WebSocket error: {}", e)))
                    }
                };
                session.set_loading(false);
                outcome
            }
            _ => {
                debug!(session_id = %pending.session_id, "dropping reply for a closed session");
                return SendOutcome::Stale;
            }
        };

        match (outcome, notice) {
            (_, Some(text)) => self.notify(NoticeLevel::Error, text),
            (SendOutcome::NoResponse, None) => self.notify(NoticeLevel::Warning, NO_RESPONSE_NOTICE),
            _ => {}
        }
        outcome
    }

    /// Send one user message and wait for the reply.
    pub async fn send(&mut self, input: &str) -> Result<SendOutcome, SessionError> {
        let pending = self.begin_send(input)?;
        let result = self
            .transport
            .exchange_message(&pending.envelope, pending.token.as_deref())
            .await;
        Ok(self.complete_send(pending, result))
    }

    /// Acknowledge a draft save. The draft itself lives on the backend.
    pub fn save_draft(&mut self) -> Result<(), SessionError> {
        self.session_mut()?;
        self.notify(NoticeLevel::Info, "Draft saved!");
        Ok(())
    }

    pub fn complete_scorecard(&mut self) -> Result<(), SessionError> {
        self.session_mut()?;
        self.notify(NoticeLevel::Success, "Scorecard completed!");
        Ok(())
    }
}

fn history_failure_text(err: &TransportError) -> String {
    match err.status() {
        Some(status) => format!("Failed to load chat history: {}", status),
        None => format!("Error loading chat history: {}", err),
    }
}
