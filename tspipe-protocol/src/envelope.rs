//! Request/response envelope framing.
//!
//! Every pipe message begins with the same fixed header:
//!
//! ```text
//! +---------+--------+------------------+
//! | version | type   | body             |
//! | 1 byte  | 2 bytes| remaining bytes  |
//! +---------+--------+------------------+
//! ```
//!
//! There is no length prefix: the transport delivers whole messages, so the
//! entire remainder after the header is the body. Any structure inside the
//! body belongs to the specific request type's codec, never to this layer.

use crate::error::ProtocolError;
use crate::types::{ProtocolVersion, RequestType};
use bytes::{BufMut, Bytes, BytesMut};

/// Size of the fixed envelope header in bytes (1 + 2).
pub const ENVELOPE_HEADER_SIZE: usize = 3;

/// A framed pipe message.
///
/// Envelopes are immutable once constructed: an envelope is either outbound,
/// freshly built from domain data, or inbound, freshly parsed from bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Protocol dialect tag.
    pub version: u8,
    /// Raw request type tag, scoped within the version.
    pub request_type: u16,
    /// Self-contained request body.
    pub body: Bytes,
}

impl Envelope {
    /// Creates an envelope for the current protocol version.
    pub fn new(request_type: u16, body: Bytes) -> Self {
        Self {
            version: ProtocolVersion::V1 as u8,
            request_type,
            body,
        }
    }

    /// Encodes the envelope: version, type, then the raw body.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(ENVELOPE_HEADER_SIZE + self.body.len());
        buf.put_u8(self.version);
        buf.put_u16(self.request_type);
        buf.put_slice(&self.body);
        buf
    }

    /// Decodes an envelope from a whole message buffer.
    ///
    /// Fails with [`ProtocolError::MalformedEnvelope`] if fewer than the
    /// fixed header width of bytes are available. The version tag is
    /// validated here; the type tag is validated at dispatch by the
    /// request type registry.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < ENVELOPE_HEADER_SIZE {
            return Err(ProtocolError::MalformedEnvelope {
                got: buf.len(),
                needed: ENVELOPE_HEADER_SIZE,
            });
        }

        let version = buf[0];
        ProtocolVersion::try_from(version)?;
        let request_type = u16::from_be_bytes([buf[1], buf[2]]);
        let body = Bytes::copy_from_slice(&buf[ENVELOPE_HEADER_SIZE..]);

        Ok(Self {
            version,
            request_type,
            body,
        })
    }

    /// Checks that this envelope carries the expected request type.
    ///
    /// Request body parsers call this before touching the body so a
    /// misrouted envelope fails on the tag, not on body shape.
    pub fn expect_type(&self, expected: RequestType) -> Result<(), ProtocolError> {
        if self.request_type != expected as u16 {
            return Err(ProtocolError::UnexpectedRequestType {
                expected: expected as u16,
                got: self.request_type,
            });
        }
        Ok(())
    }
}
