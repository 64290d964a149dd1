//! Transfer status model.
//!
//! Piece responses (and receiver acknowledgements generally) carry a status:
//! a stable code plus an optional human-readable message. Codes are part of
//! the protocol contract and must remain stable across versions.

use crate::error::ProtocolError;
use crate::wire;
use bytes::{BufMut, BytesMut};
use std::fmt;

/// Stable status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusCode {
    Success = 0,
    HandshakeRejected = 1,
    OffsetMismatch = 2,
    SealMismatch = 3,
    InternalError = 4,
}

impl StatusCode {
    /// Returns whether the sender may retry the same request after this
    /// status (possibly from a corrected offset).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StatusCode::OffsetMismatch | StatusCode::InternalError
        )
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0 => Ok(StatusCode::Success),
            1 => Ok(StatusCode::HandshakeRejected),
            2 => Ok(StatusCode::OffsetMismatch),
            3 => Ok(StatusCode::SealMismatch),
            4 => Ok(StatusCode::InternalError),
            _ => Err(ProtocolError::UnknownStatusCode(value)),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Success => write!(f, "SUCCESS"),
            StatusCode::HandshakeRejected => write!(f, "HANDSHAKE_REJECTED"),
            StatusCode::OffsetMismatch => write!(f, "OFFSET_MISMATCH"),
            StatusCode::SealMismatch => write!(f, "SEAL_MISMATCH"),
            StatusCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Status carried in acknowledgements.
///
/// Wire layout: `code (1 byte) || present flag (1 byte) || [message string]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStatus {
    pub code: StatusCode,
    pub message: Option<String>,
}

impl TransferStatus {
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Success,
            message: None,
        }
    }

    pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success
    }

    pub(crate) fn write(&self, buf: &mut BytesMut) {
        buf.put_u8(self.code as u8);
        wire::put_maybe_string(buf, self.message.as_deref());
    }

    pub(crate) fn read(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let code = StatusCode::try_from(wire::get_u8(buf)?)?;
        let message = wire::get_maybe_string(buf)?;
        Ok(Self { code, message })
    }
}
