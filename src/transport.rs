//! Network access to the scorecard backend.
//!
//! Two operations, both one-shot:
//! - `fetch_history`: `GET {api_base}/history/{thread_id}` over HTTP.
//! - `exchange_message`: open a WebSocket, send one frame, read replies until
//!   one ends the turn, close.
//!
//! Nothing here retries or keeps connections around. Every exchange is a full
//! connect/send/receive/close cycle, and the socket is closed on every path
//! once it has been opened.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::protocol::{
    has_malformed_data, is_terminal_frame, History, HistoryResponse, InboundEvent, OutboundEnvelope,
};

/// The two network operations the session controller needs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Load a recorded conversation.
    async fn fetch_history(
        &self,
        thread_id: &str,
        token: Option<&str>,
    ) -> Result<History, TransportError>;

    /// Send one envelope and wait for the reply.
    async fn exchange_message(
        &self,
        envelope: &OutboundEnvelope,
        token: Option<&str>,
    ) -> Result<InboundEvent, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch_history(
        &self,
        thread_id: &str,
        token: Option<&str>,
    ) -> Result<History, TransportError> {
        (**self).fetch_history(thread_id, token).await
    }

    async fn exchange_message(
        &self,
        envelope: &OutboundEnvelope,
        token: Option<&str>,
    ) -> Result<InboundEvent, TransportError> {
        (**self).exchange_message(envelope, token).await
    }
}

fn bearer(token: Option<&str>) -> Option<String> {
    token.filter(|t| !t.is_empty()).map(|t| format!("Bearer {}", t))
}

// ---------------------------------------------------------------------------
// Production transport: reqwest + tokio-tungstenite
// ---------------------------------------------------------------------------

pub struct BackendTransport {
    config: ClientConfig,
    http: reqwest::Client,
}

impl BackendTransport {
    pub fn new(config: ClientConfig) -> Self {
        // Client::builder() only fails when the TLS backend cannot initialize;
        // fall back to a default client rather than panicking.
        let http = reqwest::Client::builder()
            .connect_timeout(config.exchange_timeout)
            .timeout(config.exchange_timeout)
            .build()
            .unwrap_or_default();
        BackendTransport { config, http }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `{api_base}/history/{thread_id}` with the id encoded as one path segment.
    pub fn history_url(&self, thread_id: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.config.api_base_url).map_err(|e| {
            TransportError::InvalidRequest { detail: format!("bad API base URL: {}", e) }
        })?;
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidRequest {
                detail: format!("API base URL cannot have a path: {}", self.config.api_base_url),
            })?
            .pop_if_empty()
            .push("history")
            .push(thread_id);
        Ok(url)
    }
}

#[async_trait]
impl Transport for BackendTransport {
    async fn fetch_history(
        &self,
        thread_id: &str,
        token: Option<&str>,
    ) -> Result<History, TransportError> {
        let url = self.history_url(thread_id)?;
        let mut request = self.http.get(url.clone());
        if let Some(value) = bearer(token) {
            request = request.header(reqwest::header::AUTHORIZATION, value);
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { url: url.to_string(), after: self.config.exchange_timeout }
            } else {
                TransportError::Connect { url: url.to_string(), detail: e.to_string() }
            }
        })?;

        if resp.status() != StatusCode::OK {
            warn!(status = resp.status().as_u16(), %url, "history request rejected");
            return Err(TransportError::Status { status: resp.status().as_u16(), url: url.to_string() });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Decode { detail: e.to_string() })?;
        let body: HistoryResponse = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Decode { detail: e.to_string() })?;
        let history = History::from(body);
        info!(thread_id, messages = history.messages.len(), "history loaded");
        Ok(history)
    }

    async fn exchange_message(
        &self,
        envelope: &OutboundEnvelope,
        token: Option<&str>,
    ) -> Result<InboundEvent, TransportError> {
        let exchange_id = Uuid::new_v4();
        let url = self.config.ws_url.as_str();
        let limit = self.config.exchange_timeout;

        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidRequest { detail: e.to_string() })?;
        if let Some(value) = bearer(token) {
            let value = HeaderValue::from_str(&value)
                .map_err(|e| TransportError::InvalidRequest { detail: format!("bad token: {}", e) })?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        let payload = serde_json::to_string(envelope)
            .map_err(|e| TransportError::InvalidRequest { detail: e.to_string() })?;

        let (mut ws, _response) = match tokio::time::timeout(limit, tokio_tungstenite::connect_async(request)).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                return Err(TransportError::Connect { url: url.to_string(), detail: e.to_string() })
            }
            Err(_) => return Err(TransportError::Timeout { url: url.to_string(), after: limit }),
        };
        debug!(%exchange_id, url, "websocket connected");

        let outcome = match ws.send(WsMessage::Text(payload)).await {
            Ok(()) => Ok(collect_reply(&mut ws, limit).await),
            Err(e) => Err(TransportError::Send { detail: e.to_string() }),
        };

        match tokio::time::timeout(limit, ws.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(%exchange_id, error = %e, "ignoring websocket close error"),
            Err(_) => debug!(%exchange_id, "ignoring websocket close timeout"),
        }

        let event = match outcome? {
            Some(frame) => InboundEvent::from_value(&frame),
            None => InboundEvent::Empty,
        };
        info!(%exchange_id, empty = event.is_empty(), "exchange finished");
        Ok(event)
    }
}

/// Read frames until one ends the turn, a read times out or fails, or the
/// peer closes. Returns the last JSON frame collected, if any.
///
/// The stop test looks at the frame just received, and that frame is also
/// the last one collected. When the loop ends for any other reason the
/// result is the last (non-terminal) frame seen.
pub async fn collect_reply<S>(stream: &mut S, read_timeout: Duration) -> Option<Value>
where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    let mut last: Option<Value> = None;
    let mut frames = 0usize;

    loop {
        let msg = match tokio::time::timeout(read_timeout, stream.next()).await {
            Err(_) => {
                debug!(frames, "read timed out, using what we have");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                debug!(frames, error = %e, "read failed, using what we have");
                break;
            }
            Ok(Some(Ok(msg))) => msg,
        };

        let text = match msg {
            WsMessage::Text(text) => text,
            WsMessage::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => break,
            },
            WsMessage::Close(_) => break,
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
        };
        if text.is_empty() {
            continue;
        }

        let frame: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                debug!(frames, error = %e, "undecodable frame ends the read");
                break;
            }
        };
        frames += 1;

        // Non-object frames and frames with a non-object `data` are kept but
        // end the read, like a terminal frame.
        let keep_reading =
            frame.is_object() && !is_terminal_frame(&frame) && !has_malformed_data(&frame);
        last = Some(frame);
        if !keep_reading {
            break;
        }
    }

    last
}
