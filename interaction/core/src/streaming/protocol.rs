//! Chat Completions Wire Protocol
//!
//! Request bodies follow the OpenAI-style chat completions shape:
//!
//! ```json
//! {"messages": [{"role": "user", "content": "Hi"}], "temperature": 0.7,
//!  "max_tokens": 256, "stream": true}
//! ```
//!
//! Streaming responses are SSE-like: each relevant line is
//! `data: <payload>`, where the payload is either the `[DONE]` sentinel or a
//! JSON object carrying `choices[0].delta.content`. Every other line is
//! ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ProtocolParseError;

/// Prefix of event records
pub const DATA_PREFIX: &str = "data:";

/// Payload signalling normal end of stream
pub const DONE_SENTINEL: &str = "[DONE]";

// ============================================================================
// Requests
// ============================================================================

/// Author of a chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions
    System,
    /// End user
    User,
    /// Model output
    Assistant,
}

/// One chat message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: ChatRole,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    /// A system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// JSON body of a chat completions request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Response token limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Whether the server should stream the response
    #[serde(default)]
    pub stream: bool,
    /// Structured output format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    /// Provider-specific fields passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    /// A request for `prompt`, optionally preceded by a system prompt
    pub fn from_prompt(prompt: impl Into<String>, system: Option<&str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        Self {
            messages,
            stream: true,
            ..Default::default()
        }
    }

    /// Set streaming mode
    #[must_use]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the response token limit
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Add a provider-specific field
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Where and how to send a chat request
#[derive(Clone, Debug, PartialEq)]
pub struct StreamRequest {
    /// Endpoint URL
    pub url: String,
    /// Bearer token, if the endpoint requires one
    pub api_key: Option<String>,
    /// Request body
    pub body: ChatRequest,
}

impl StreamRequest {
    /// Create a request descriptor
    pub fn new(url: impl Into<String>, body: ChatRequest) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            body,
        }
    }

    /// Set the bearer token
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

// ============================================================================
// Stream records
// ============================================================================

/// Interpretation of one framed line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Record<'a> {
    /// `data:` record with a non-sentinel payload (prefix and whitespace trimmed)
    Data(&'a str),
    /// The terminal sentinel
    Done,
    /// Anything else (comments, `event:` lines, blank keep-alives)
    Ignored,
}

/// Classify a framed line
#[must_use]
pub fn parse_record(line: &str) -> Record<'_> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Record::Ignored;
    };

    match payload.trim() {
        DONE_SENTINEL => Record::Done,
        "" => Record::Ignored,
        payload => Record::Data(payload),
    }
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the content fragment from a `data:` payload
///
/// Returns `Ok(None)` for well-formed payloads without content (role-only
/// deltas, empty strings, usage trailers).
///
/// # Errors
///
/// Returns [`ProtocolParseError`] if the payload is not a JSON object of the
/// expected shape.
pub fn parse_fragment(payload: &str) -> Result<Option<String>, ProtocolParseError> {
    let chunk: ChunkPayload =
        serde_json::from_str(payload).map_err(|source| ProtocolParseError {
            payload: payload.to_string(),
            source,
        })?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty()))
}
