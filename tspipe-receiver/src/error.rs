//! Receiver error types.

use thiserror::Error;
use tspipe_protocol::ProtocolError;

/// Errors from the receiver-side transfer state machine.
#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("offset gap for '{resource}': expected at most {expected}, got {got}")]
    OffsetGap {
        resource: String,
        expected: u64,
        got: u64,
    },

    #[error("resource '{0}' is already sealed")]
    AlreadySealed(String),

    #[error("invalid resource name: '{0}'")]
    InvalidResourceName(String),

    #[error("length mismatch for '{resource}': seal asserts {expected}, accumulated {actual}")]
    LengthMismatch {
        resource: String,
        expected: u64,
        actual: u64,
    },

    #[error("unexpected message kind for a receiver: {0}")]
    UnexpectedMessage(&'static str),
}
