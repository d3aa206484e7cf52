//! Wire types for the scorecard backend: the outbound WebSocket envelope, the
//! inbound reply frames, and the HTTP history body.
//!
//! Inbound payloads come in two shapes (the enveloped `ai_message` and an older
//! bare `{content}` form). They are decoded once, here, into [`InboundEvent`]
//! so that nothing downstream probes optional JSON fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::scorecard::{ScorecardDraft, SectionUpdate};

/// Content used when a reply carries no `content` field at all.
pub const DEFAULT_REPLY_CONTENT: &str = "Response received";

/// Frame `type` that marks the assistant's main reply.
pub const AI_MESSAGE_TYPE: &str = "ai_message";

// -- Conversation messages --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMessage")]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message { role: Role::Assistant, content: content.into() }
    }
}

/// History entries are loosely shaped; anything that is not `user` is shown
/// on the assistant side.
#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Value,
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        let role = match raw.role.as_deref() {
            Some("user") => Role::User,
            _ => Role::Assistant,
        };
        let content = match raw.content {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Message { role, content }
    }
}

// -- Outbound envelope -------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundKind {
    UserMessage,
    SystemMessage,
    StateUpdate,
    Error,
}

/// The single JSON frame sent per exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    #[serde(rename = "type")]
    pub kind: OutboundKind,
    pub job_title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl OutboundEnvelope {
    pub fn new(
        kind: OutboundKind,
        job_title: impl Into<String>,
        content: impl Into<String>,
        thread_id: Option<&str>,
    ) -> Self {
        OutboundEnvelope {
            kind,
            job_title: job_title.into(),
            content: content.into(),
            thread_id: thread_id.filter(|t| !t.is_empty()).map(str::to_string),
        }
    }

    pub fn user_message(
        job_title: impl Into<String>,
        content: impl Into<String>,
        thread_id: Option<&str>,
    ) -> Self {
        Self::new(OutboundKind::UserMessage, job_title, content, thread_id)
    }
}

// -- Inbound events ----------------------------------------------------------

/// A decoded reply from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    AiMessage {
        content: String,
        thread_id: Option<String>,
        sections: SectionUpdate,
    },
    LegacyMessage {
        content: String,
    },
    Empty,
}

impl InboundEvent {
    /// Decode a raw text frame. Malformed JSON decodes to `Empty`.
    pub fn decode(text: &str) -> InboundEvent {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => InboundEvent::from_value(&value),
            Err(_) => InboundEvent::Empty,
        }
    }

    pub fn from_value(value: &Value) -> InboundEvent {
        let Some(obj) = value.as_object() else {
            return InboundEvent::Empty;
        };

        let is_ai = obj.get("type").and_then(Value::as_str) == Some(AI_MESSAGE_TYPE);
        if let (true, Some(data)) = (is_ai, obj.get("data").and_then(Value::as_object)) {
            let thread_id = data
                .get("thread_id")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            return InboundEvent::AiMessage {
                content: content_or_default(data.get("content")),
                thread_id,
                sections: SectionUpdate::from_json_object(data),
            };
        }

        InboundEvent::LegacyMessage { content: content_or_default(obj.get("content")) }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, InboundEvent::Empty)
    }
}

fn content_or_default(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => DEFAULT_REPLY_CONTENT.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Whether a received frame ends the receive loop: either it is an
/// `ai_message`, or it carries a non-empty `data.content`.
pub fn is_terminal_frame(frame: &Value) -> bool {
    if frame.get("type").and_then(Value::as_str) == Some(AI_MESSAGE_TYPE) {
        return true;
    }
    frame
        .get("data")
        .and_then(|d| d.get("content"))
        .map(is_truthy)
        .unwrap_or(false)
}

/// Whether a frame carries a `data` key whose value is not an object
/// (`"data": null`, `"data": "busy"`). Such a frame cannot be inspected
/// further and ends the receive loop.
pub fn has_malformed_data(frame: &Value) -> bool {
    matches!(frame.get("data"), Some(data) if !data.is_object())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// -- History -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub state: Value,
}

/// A previously recorded conversation, ready to seed a resumed session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    pub messages: Vec<Message>,
    pub draft: ScorecardDraft,
}

impl From<HistoryResponse> for History {
    fn from(resp: HistoryResponse) -> Self {
        History {
            messages: resp.messages.unwrap_or_default(),
            draft: ScorecardDraft::from_json(&resp.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorecard::SectionName;
    use serde_json::json;

    #[test]
    fn test_envelope_serializes_without_thread_id() {
        let env = OutboundEnvelope::user_message("Senior Engineer", "hello", None);
        let v: Value = serde_json::to_value(&env).expect("serialize");
        assert_eq!(v, json!({"type": "user_message", "job_title": "Senior Engineer", "content": "hello"}));
    }

    #[test]
    fn test_envelope_drops_empty_thread_id() {
        let env = OutboundEnvelope::user_message("PM", "hi", Some(""));
        assert!(env.thread_id.is_none());
        let env = OutboundEnvelope::user_message("PM", "hi", Some("abc123"));
        assert_eq!(env.thread_id.as_deref(), Some("abc123"));
        let v: Value = serde_json::to_value(&env).expect("serialize");
        assert_eq!(v["thread_id"], "abc123");
    }

    #[test]
    fn test_outbound_kinds_serialize_snake_case() {
        let kinds = [
            (OutboundKind::UserMessage, "user_message"),
            (OutboundKind::SystemMessage, "system_message"),
            (OutboundKind::StateUpdate, "state_update"),
            (OutboundKind::Error, "error"),
        ];
        for (kind, wire) in kinds {
            assert_eq!(serde_json::to_value(kind).expect("serialize"), json!(wire));
        }
    }

    #[test]
    fn test_decode_ai_message() {
        let event = InboundEvent::decode(
            r#"{"type":"ai_message","data":{"content":"Hi","thread_id":"t1","mission":{"goal":"grow"}}}"#,
        );
        match event {
            InboundEvent::AiMessage { content, thread_id, sections } => {
                assert_eq!(content, "Hi");
                assert_eq!(thread_id.as_deref(), Some("t1"));
                assert_eq!(sections.get(SectionName::Mission).map(|f| f["goal"].as_str()), Some("grow"));
            }
            other => panic!("expected AiMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_ai_message_missing_content_uses_default() {
        let event = InboundEvent::decode(r#"{"type":"ai_message","data":{"thread_id":""}}"#);
        assert_eq!(
            event,
            InboundEvent::AiMessage {
                content: DEFAULT_REPLY_CONTENT.to_string(),
                thread_id: None,
                sections: SectionUpdate::new(),
            }
        );
    }

    #[test]
    fn test_decode_ai_message_without_data_is_legacy() {
        let event = InboundEvent::decode(r#"{"type":"ai_message","content":"bare"}"#);
        assert_eq!(event, InboundEvent::LegacyMessage { content: "bare".to_string() });
    }

    #[test]
    fn test_decode_legacy_message() {
        let event = InboundEvent::decode(r#"{"content":"old style"}"#);
        assert_eq!(event, InboundEvent::LegacyMessage { content: "old style".to_string() });
        let event = InboundEvent::decode(r#"{"type":"status"}"#);
        assert_eq!(event, InboundEvent::LegacyMessage { content: DEFAULT_REPLY_CONTENT.to_string() });
    }

    #[test]
    fn test_decode_malformed_is_empty() {
        assert!(InboundEvent::decode("not json").is_empty());
        assert!(InboundEvent::decode("[1,2,3]").is_empty());
        assert!(InboundEvent::decode("\"text\"").is_empty());
    }

    #[test]
    fn test_terminal_frame_detection() {
        assert!(is_terminal_frame(&json!({"type": "ai_message"})));
        assert!(is_terminal_frame(&json!({"type": "status", "data": {"content": "x"}})));
        assert!(!is_terminal_frame(&json!({"type": "status", "data": {"content": ""}})));
        assert!(!is_terminal_frame(&json!({"type": "typing"})));
        assert!(!is_terminal_frame(&json!({"content": "legacy"})));
    }

    #[test]
    fn test_malformed_data_detection() {
        assert!(has_malformed_data(&json!({"type": "status", "data": "busy"})));
        assert!(has_malformed_data(&json!({"type": "status", "data": null})));
        assert!(has_malformed_data(&json!({"data": [1, 2]})));
        assert!(!has_malformed_data(&json!({"type": "status", "data": {}})));
        assert!(!has_malformed_data(&json!({"type": "typing"})));
    }

    #[test]
    fn test_message_deserializes_unknown_role_as_assistant() {
        let msgs: Vec<Message> = serde_json::from_value(json!([
            {"role": "user", "content": "a"},
            {"role": "assistant", "content": "b"},
            {"role": "system", "content": "c"},
            {"content": "d"},
        ]))
        .expect("deserialize");
        let roles: Vec<Role> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Assistant, Role::Assistant]);
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let v = serde_json::to_value(Message::user("hey")).expect("serialize");
        assert_eq!(v, json!({"role": "user", "content": "hey"}));
    }

    #[test]
    fn test_history_defaults_missing_fields() {
        let resp: HistoryResponse = serde_json::from_str("{}").expect("deserialize");
        let history = History::from(resp);
        assert!(history.messages.is_empty());
        assert!(history.draft.is_empty());

        let resp: HistoryResponse =
            serde_json::from_str(r#"{"messages":null,"state":null}"#).expect("deserialize");
        assert_eq!(History::from(resp), History::default());
    }

    #[test]
    fn test_history_parses_messages_and_state() {
        let resp: HistoryResponse = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}, {"role": "assistant", "content": "hello"}],
            "state": {"culture": {"pace": "fast"}, "job_title": "ignored"},
        }))
        .expect("deserialize");
        let history = History::from(resp);
        assert_eq!(history.messages, vec![Message::user("hi"), Message::assistant("hello")]);
        assert_eq!(history.draft.populated(), 1);
    }
}
