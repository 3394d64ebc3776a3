//! Non-streaming completions
//!
//! One request, one JSON response:
//!
//! ```json
//! {"response": "...", "usage": {...}, "model": "...", "id": "..."}
//! ```
//!
//! Some servers put the content under `text` instead of `response`; both are
//! accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TransportError;
use super::protocol::StreamRequest;
use super::transport::StreamTransport;

/// Name used when a schema is not given one
pub const DEFAULT_SCHEMA_NAME: &str = "response";

/// Result of a non-streaming completion
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text (empty if the server returned none)
    pub content: String,
    /// Token usage as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    /// Model that served the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Server-side response id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Parsed structured output, for [`StreamTransport::complete_structured`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

/// JSON schema requested for structured output
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseSchema {
    /// Schema name
    pub name: String,
    /// Optional human description
    pub description: Option<String>,
    /// The JSON schema itself
    pub schema: Value,
}

impl ResponseSchema {
    /// Schema with the default name
    #[must_use]
    pub fn new(schema: Value) -> Self {
        Self {
            name: DEFAULT_SCHEMA_NAME.to_string(),
            description: None,
            schema,
        }
    }

    /// Set the schema name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The `response_format` request field
    #[must_use]
    pub fn response_format(&self) -> Value {
        let mut json_schema = serde_json::json!({
            "name": self.name,
            "schema": self.schema,
        });
        if let Some(description) = &self.description {
            json_schema["description"] = Value::from(description.as_str());
        }

        serde_json::json!({
            "type": "json_schema",
            "json_schema": json_schema,
        })
    }
}

#[derive(Deserialize)]
struct RawCompletion {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    usage: Option<Value>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

impl From<RawCompletion> for Completion {
    fn from(raw: RawCompletion) -> Self {
        let content = raw
            .response
            .filter(|r| !r.is_empty())
            .or(raw.text)
            .unwrap_or_default();

        Self {
            content,
            usage: raw.usage,
            model: raw.model,
            id: raw.id,
            object: None,
        }
    }
}

fn parse_completion(body: &str) -> Result<Completion, TransportError> {
    serde_json::from_str::<RawCompletion>(body)
        .map(Completion::from)
        .map_err(|e| TransportError::InvalidResponse(e.to_string()))
}

impl StreamTransport {
    /// Send `request` without streaming and return the whole completion
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on connection failure, non-success status,
    /// or a response body that is not the expected JSON.
    pub async fn complete(&self, mut request: StreamRequest) -> Result<Completion, TransportError> {
        request.body.stream = false;

        let response = self.send(&request).await?;
        let body = response.text().await?;
        let completion = parse_completion(&body)?;

        tracing::debug!(
            model = completion.model.as_deref().unwrap_or("unknown"),
            chars = completion.content.len(),
            "completion received"
        );
        Ok(completion)
    }

    /// Like [`StreamTransport::complete`], requesting output matching `schema`
    ///
    /// The content is parsed as JSON into [`Completion::object`]; it stays
    /// `None` if the content is not valid JSON.
    ///
    /// # Errors
    ///
    /// Same as [`StreamTransport::complete`].
    pub async fn complete_structured(
        &self,
        mut request: StreamRequest,
        schema: &ResponseSchema,
    ) -> Result<Completion, TransportError> {
        request.body.response_format = Some(schema.response_format());

        let mut completion = self.complete(request).await?;
        if !completion.content.is_empty() {
            completion.object = serde_json::from_str(&completion.content).ok();
            if completion.object.is_none() {
                tracing::debug!(schema = %schema.name, "structured content is not valid JSON");
            }
        }
        Ok(completion)
    }
}
