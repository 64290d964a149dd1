//! Protocol error types.

use thiserror::Error;

/// Errors surfaced by envelope framing and request body codecs.
///
/// All failures are local and synchronous: a decode error aborts the single
/// message being processed and never retries or falls back to a default.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {got} bytes, header needs {needed}")]
    MalformedEnvelope { got: usize, needed: usize },

    #[error("unknown protocol version: {0}")]
    UnknownVersion(u8),

    #[error("unknown request type: {0}")]
    UnknownRequestType(u16),

    #[error("unexpected request type: expected {expected}, got {got}")]
    UnexpectedRequestType { expected: u16, got: u16 },

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("truncated batch: declared {declared} bytes, {remaining} remaining")]
    TruncatedBatch { declared: usize, remaining: usize },

    #[error("unknown status code: {0}")]
    UnknownStatusCode(u8),

    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
}

impl ProtocolError {
    /// Shorthand for a body-level decode failure.
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        ProtocolError::DecodeError(msg.into())
    }
}
