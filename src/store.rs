//! The in-memory conversation record.
//!
//! A [`ConversationSession`] is owned by the session controller. Renderers get
//! `&ConversationSession` and can only read it.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::{History, Message};
use crate::reconcile::SessionDelta;
use crate::scorecard::{ScorecardDraft, SectionUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSession {
    /// Local identity of this session object; distinct from the backend thread id.
    id: Uuid,
    thread_id: Option<String>,
    job_title: String,
    auth_token: Option<String>,
    messages: Vec<Message>,
    draft: ScorecardDraft,
    loading: bool,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.is_empty())
}

impl ConversationSession {
    /// A new conversation with no thread yet.
    pub fn fresh(job_title: impl Into<String>, auth_token: Option<String>) -> Self {
        ConversationSession {
            id: Uuid::new_v4(),
            thread_id: None,
            job_title: job_title.into(),
            auth_token: non_empty(auth_token),
            messages: Vec::new(),
            draft: ScorecardDraft::new(),
            loading: false,
        }
    }

    /// A conversation seeded from a fetched history.
    pub fn resumed(
        job_title: impl Into<String>,
        auth_token: Option<String>,
        thread_id: impl Into<String>,
        history: History,
    ) -> Self {
        ConversationSession {
            id: Uuid::new_v4(),
            thread_id: non_empty(Some(thread_id.into())),
            job_title: job_title.into(),
            auth_token: non_empty(auth_token),
            messages: history.messages,
            draft: history.draft,
            loading: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn job_title(&self) -> &str {
        &self.job_title
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &ScorecardDraft {
        &self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn merge_sections(&mut self, update: &SectionUpdate) {
        if !update.is_empty() {
            debug!(sections = update.len(), "merging scorecard sections");
            self.draft.merge(update);
        }
    }

    /// Record the backend's thread id. A different value from the one already
    /// held replaces it: the backend owns conversation identity.
    pub fn set_thread_id(&mut self, thread_id: impl Into<String>) {
        let thread_id = thread_id.into();
        if thread_id.is_empty() {
            return;
        }
        match self.thread_id.as_deref() {
            Some(current) if current == thread_id => {}
            Some(current) => {
                warn!(old = %current, new = %thread_id, "backend reassigned thread id");
                self.thread_id = Some(thread_id);
            }
            None => {
                debug!(thread_id = %thread_id, "thread id assigned");
                self.thread_id = Some(thread_id);
            }
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Apply a reconciled delta: thread id, then sections, then the message.
    pub fn apply(&mut self, delta: SessionDelta) {
        if let Some(thread_id) = delta.thread_id {
            self.set_thread_id(thread_id);
        }
        self.merge_sections(&delta.sections);
        if let Some(message) = delta.append {
            self.append_message(message);
        }
    }
}
