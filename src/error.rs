//! Crate-level error types.
//!
//! Transport failures never escape the session controller: they are turned
//! into notices at the point of call. The enums here exist so that the
//! conversion keeps enough context (status code, URL, detail) to tell the
//! user what went wrong.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single network operation (history fetch or message exchange).
#[derive(Debug, Error)]
pub enum TransportError {
    /// A TCP/TLS/WebSocket-level connection could not be established.
    #[error("connection failed to {url}: {detail}")]
    Connect { url: String, detail: String },

    /// The remote server replied with a non-200 HTTP status code.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The connect phase did not finish within the configured bound.
    #[error("timed out after {after:?} connecting to {url}")]
    Timeout { url: String, after: Duration },

    /// The outbound frame could not be written to the socket.
    #[error("failed to send frame: {detail}")]
    Send { detail: String },

    /// A response body could not be parsed as the expected JSON structure.
    #[error("malformed response: {detail}")]
    Decode { detail: String },

    /// The request could not be built (bad URL, header value, payload).
    #[error("invalid request: {detail}")]
    InvalidRequest { detail: String },
}

impl TransportError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Rejected or failed session-controller operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a job title is required")]
    MissingJobTitle,

    #[error("message is empty")]
    EmptyInput,

    /// A message exchange is already in flight.
    #[error("a message is already being sent")]
    Busy,

    #[error("no conversation is open")]
    NotInChat,

    #[error("a conversation is already open")]
    NotInCreate,

    #[error("failed to load chat history: {0}")]
    History(#[source] TransportError),
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Top-level error for callers that drive the whole client.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display_status() {
        let err = TransportError::Status {
            status: 404,
            url: "http://localhost:8003/api/v1/scorecard/history/abc".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("404"), "expected status in display: {s}");
        assert!(s.contains("/history/abc"), "expected url: {s}");
    }

    #[test]
    fn transport_error_display_connect() {
        let err = TransportError::Connect {
            url: "ws://localhost:8003".to_string(),
            detail: "connection refused".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("ws://localhost:8003"));
        assert!(s.contains("connection refused"));
    }

    #[test]
    fn transport_error_status_accessor() {
        let err = TransportError::Status { status: 503, url: "x".to_string() };
        assert_eq!(err.status(), Some(503));
        let err = TransportError::Send { detail: "broken pipe".to_string() };
        assert_eq!(err.status(), None);
    }

    #[test]
    fn session_error_history_keeps_source() {
        use std::error::Error as _;
        let err = SessionError::History(TransportError::Status { status: 404, url: "u".into() });
        assert!(err.to_string().contains("HTTP 404"));
        assert!(err.source().is_some());
    }

    #[test]
    fn crate_error_from_session_error() {
        let err: Error = SessionError::Busy.into();
        assert!(matches!(err, Error::Session(SessionError::Busy)));
        assert_eq!(err.to_string(), "a message is already being sent");
    }

    #[test]
    fn errors_are_std_errors() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<TransportError>();
        assert_error::<SessionError>();
        assert_error::<ConfigError>();
        assert_error::<Error>();
    }
}
