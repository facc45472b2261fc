// Claude API streaming client using reqwest-eventsource.
//
// Sends messages to the Anthropic Messages API with `stream: true` and parses
// the Server-Sent Events into `LlmEvent` variants that are forwarded over an
// mpsc channel for the app orchestrator to consume.

use futures_util::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::protocol::LlmEvent;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// ClaudeClient
// ---------------------------------------------------------------------------

/// Generation parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestParams {
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Low-level Claude API streaming client.
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl ClaudeClient {
    /// Create a new client with the given API key and model identifier.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Point the client at a different Messages endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Send a message to the Claude API and stream the response as `LlmEvent`s
    /// over `tx`.
    ///
    /// The `generation` counter is threaded through every emitted event so that
    /// the receiving side can discard stale events from cancelled tasks.
    ///
    /// The method returns when the stream is complete, an error occurs, or the
    /// receiver is dropped.
    pub async fn stream_message(
        &self,
        system: &str,
        user_content: &str,
        params: RequestParams,
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: "API key not configured".to_string(),
                    generation,
                })
                .await;
            return Ok(());
        }

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "stream": true,
            "system": system,
            "messages": [{ "role": "user", "content": user_content }]
        });

        let request = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let mut es = match request.eventsource() {
            Ok(es) => es,
            Err(e) => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: format!("Failed to create event source: {e}"),
                        generation,
                    })
                    .await;
                return Ok(());
            }
        };

        let mut full_text = String::new();
        let mut input_tokens: u32 = 0;
        let mut output_tokens: u32 = 0;
        let mut stop_reason: Option<String> = None;

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("SSE connection opened");
                }
                Ok(Event::Message(msg)) => {
                    let event_type = msg.event.as_str();
                    let data = &msg.data;

                    match event_type {
                        "message_start" => {
                            match parse_input_tokens(data) {
                                Some(n) => input_tokens = n,
                                None => warn!("failed to parse input_tokens from message_start"),
                            }
                            debug!(input_tokens, "message_start");
                        }
                        "content_block_delta" => {
                            if let Some(text) = parse_delta_text(data) {
                                full_text.push_str(&text);
                                if tx
                                    .send(LlmEvent::Token { text, generation })
                                    .await
                                    .is_err()
                                {
                                    // Receiver dropped, abort stream.
                                    es.close();
                                    return Ok(());
                                }
                            }
                        }
                        "message_delta" => {
                            match parse_output_tokens(data) {
                                Some(n) => output_tokens = n,
                                None => warn!("failed to parse output_tokens from message_delta"),
                            }
                            stop_reason = parse_stop_reason(data).or(stop_reason);
                            debug!(output_tokens, ?stop_reason, "message_delta");
                        }
                        "message_stop" => {
                            debug!("message_stop, streaming complete");
                            let _ = tx
                                .send(LlmEvent::Complete {
                                    full_text,
                                    input_tokens,
                                    output_tokens,
                                    stop_reason,
                                    generation,
                                })
                                .await;
                            es.close();
                            return Ok(());
                        }
                        "error" => {
                            let message = parse_stream_error(data)
                                .unwrap_or_else(|| "API reported an error".to_string());
                            warn!(%message, "SSE error event");
                            let _ = tx.send(LlmEvent::Error { message, generation }).await;
                            es.close();
                            return Ok(());
                        }
                        // Ignore ping, content_block_start, content_block_stop, etc.
                        _ => {
                            debug!(event_type, "ignoring SSE event");
                        }
                    }
                }
                Err(err) => {
                    warn!(?err, "SSE stream error");
                    let error_message = extract_error_message(&err);
                    let _ = tx
                        .send(LlmEvent::Error {
                            message: error_message,
                            generation,
                        })
                        .await;
                    es.close();
                    return Ok(());
                }
            }
        }

        // Stream ended without message_stop.
        if full_text.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: "Stream ended unexpectedly without any content".to_string(),
                    generation,
                })
                .await;
        } else {
            let _ = tx
                .send(LlmEvent::Complete {
                    full_text,
                    input_tokens,
                    output_tokens,
                    stop_reason,
                    generation,
                })
                .await;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that can be either an active Claude client or disabled.
pub enum LlmClient {
    /// Claude API is configured and ready.
    Active(ClaudeClient),
    /// No API key configured. Recommendations are unavailable.
    Disabled,
}

impl LlmClient {
    /// Build an `LlmClient` from the application config.
    ///
    /// Returns `Active` if an API key is present in credentials, otherwise
    /// returns `Disabled`.
    pub fn from_config(config: &Config) -> Self {
        if !config.credentials.has_api_key() {
            return LlmClient::Disabled;
        }
        let key = config
            .credentials
            .anthropic_api_key
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string();
        let mut client = ClaudeClient::new(key, config.llm.model.clone());
        if let Some(url) = config.llm.base_url.as_deref().filter(|u| !u.is_empty()) {
            client = client.with_base_url(url);
        }
        LlmClient::Active(client)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }

    /// Stream a message, delegating to the inner `ClaudeClient` or immediately
    /// sending an error if disabled.
    pub async fn stream_message(
        &self,
        system: &str,
        user_content: &str,
        params: RequestParams,
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) -> anyhow::Result<()> {
        match self {
            LlmClient::Active(client) => {
                client
                    .stream_message(system, user_content, params, tx, generation)
                    .await
            }
            LlmClient::Disabled => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: "LLM not configured".to_string(),
                        generation,
                    })
                    .await;
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SSE JSON parsing helpers
// ---------------------------------------------------------------------------

/// Extract `input_tokens` from a `message_start` event's JSON.
///
/// Expected shape: `{ "type": "message_start", "message": { "usage": { "input_tokens": N } } }`
pub(crate) fn parse_input_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("message")?
        .get("usage")?
        .get("input_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// Extract `delta.text` from a `content_block_delta` event's JSON.
///
/// Expected shape: `{ "type": "content_block_delta", "delta": { "type": "text_delta", "text": "..." } }`
pub(crate) fn parse_delta_text(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("delta")?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract `output_tokens` from a `message_delta` event's JSON.
///
/// Expected shape: `{ "type": "message_delta", "usage": { "output_tokens": N } }`
pub(crate) fn parse_output_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("usage")?
        .get("output_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// Extract `delta.stop_reason` from a `message_delta` event's JSON.
pub(crate) fn parse_stop_reason(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("delta")?
        .get("stop_reason")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract `error.message` from an in-stream `error` event.
///
/// Expected shape: `{ "type": "error", "error": { "type": "overloaded_error", "message": "..." } }`
pub(crate) fn parse_stream_error(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract a human-readable error message from an SSE error.
fn extract_error_message(err: &reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _response) => {
            format!("API returned status {status}")
        }
        reqwest_eventsource::Error::Transport(e) => {
            format!("Network error: {e}")
        }
        other => format!("Stream error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
