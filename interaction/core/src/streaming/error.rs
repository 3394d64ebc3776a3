//! Streaming error types

use thiserror::Error;

/// A chat request could not be completed
///
/// Surfaced exactly once per session through `on_error`, never retried by
/// this layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established or the request failed to send
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-success status
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (best effort)
        body: String,
    },

    /// Reading the response body failed mid-stream
    #[error("response body read failed: {0}")]
    Body(String),

    /// A non-streaming response could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// HTTP status, if the failure was a status error
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Connect(e.to_string())
        }
    }
}

/// A `data:` record whose payload is not the expected fragment shape
///
/// Recovered locally: the transport skips the record.
#[derive(Debug, Error)]
#[error("unparseable stream payload: {source}")]
pub struct ProtocolParseError {
    /// The payload that failed to parse
    pub payload: String,
    /// The JSON error
    #[source]
    pub source: serde_json::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = TransportError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "server returned 502: bad gateway");
        assert_eq!(err.status(), Some(502));
        assert_eq!(TransportError::Connect("refused".into()).status(), None);
    }
}
