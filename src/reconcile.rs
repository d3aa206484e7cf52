//! Turn a decoded reply into the state change it implies.

use crate::protocol::{InboundEvent, Message};
use crate::scorecard::SectionUpdate;

/// Handshake acknowledgement the backend sends as an `ai_message`. It carries
/// state but is not part of the visible conversation.
pub const CONNECTION_ESTABLISHED: &str = "connection established";

/// State change produced by one inbound event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDelta {
    pub thread_id: Option<String>,
    pub sections: SectionUpdate,
    pub append: Option<Message>,
}

impl SessionDelta {
    pub fn is_noop(&self) -> bool {
        self.thread_id.is_none() && self.sections.is_empty() && self.append.is_none()
    }
}

pub fn is_connection_ack(content: &str) -> bool {
    content.trim().to_lowercase() == CONNECTION_ESTABLISHED
}

/// Compute the delta for `event`. Pure: no I/O, no access to the store.
pub fn reconcile(event: InboundEvent) -> SessionDelta {
    match event {
        InboundEvent::AiMessage { content, thread_id, sections } => {
            let append = if is_connection_ack(&content) {
                None
            } else {
                Some(Message::assistant(content))
            };
            SessionDelta { thread_id, sections, append }
        }
        InboundEvent::LegacyMessage { content } => SessionDelta {
            append: Some(Message::assistant(content)),
            ..SessionDelta::default()
        },
        InboundEvent::Empty => SessionDelta::default(),
    }
}
