//! Model error types.

use thiserror::Error;
use tspipe_protocol::ProtocolError;

/// Errors from encoding or decoding time-series operation payloads.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown data type tag: {0}")]
    UnknownDataType(u8),

    #[error("wire decode: {0}")]
    Wire(#[from] ProtocolError),

    #[error("column count mismatch: {expected} columns, got {got} cells")]
    ColumnCountMismatch { expected: usize, got: usize },

    #[error("value type mismatch in column '{column}': expected {expected:?}, got {got:?}")]
    ValueTypeMismatch {
        column: String,
        expected: crate::types::DataType,
        got: crate::types::DataType,
    },

    #[error("invalid aligned flag: {0}")]
    InvalidAlignedFlag(u8),

    #[error("invalid cell presence flag: {0}")]
    InvalidPresenceFlag(u8),

    #[error("trailing bytes after payload: {0} remaining")]
    TrailingBytes(usize),
}
