//! Data operation requests.
//!
//! Thin envelopes around opaque, pre-serialized operation payloads. The
//! payload bytes are stored verbatim as the envelope body and extracted
//! verbatim on decode; `from_envelope(to_envelope(x))` is byte-for-byte
//! identity on the payload. Reconstructing a logical statement from the
//! payload is a derived, on-demand operation that goes through the storage
//! layer's [`StorageCodec`] capability.

use crate::codec::{OperationKind, Statement, StorageCodec};
use crate::envelope::Envelope;
use crate::error::ProtocolError;
use crate::types::RequestType;
use bytes::Bytes;

/// A pre-serialized write-ahead-log operation, shipped as-is.
///
/// The receiver replays these bytes through its own log codec; the protocol
/// layer never interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabletBinaryReq {
    pub payload: Bytes,
}

impl TabletBinaryReq {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(RequestType::TabletBinary as u16, self.payload.clone())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(RequestType::TabletBinary)?;
        Ok(Self {
            payload: envelope.body.clone(),
        })
    }
}

/// A serialized insert-node operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabletInsertNodeReq {
    pub payload: Bytes,
}

impl TabletInsertNodeReq {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(RequestType::TabletInsertNode as u16, self.payload.clone())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(RequestType::TabletInsertNode)?;
        Ok(Self {
            payload: envelope.body.clone(),
        })
    }

    /// Reconstructs the insert statement this payload describes.
    pub fn construct_statement<C: StorageCodec>(
        &self,
        codec: &C,
    ) -> Result<Statement<C::View, C::Path>, C::Error> {
        construct(codec, OperationKind::InsertNode, &self.payload)
    }
}

/// A serialized schema-plan operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPlanReq {
    pub payload: Bytes,
}

impl SchemaPlanReq {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(RequestType::SchemaPlan as u16, self.payload.clone())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(RequestType::SchemaPlan)?;
        Ok(Self {
            payload: envelope.body.clone(),
        })
    }

    /// Reconstructs the schema statement this payload describes.
    pub fn construct_statement<C: StorageCodec>(
        &self,
        codec: &C,
    ) -> Result<Statement<C::View, C::Path>, C::Error> {
        construct(codec, OperationKind::SchemaPlan, &self.payload)
    }
}

/// Serialized raw tabular data (a tablet image followed by its aligned
/// flag byte).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabletRawReq {
    pub payload: Bytes,
}

impl TabletRawReq {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope::new(RequestType::TabletRaw as u16, self.payload.clone())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(RequestType::TabletRaw)?;
        Ok(Self {
            payload: envelope.body.clone(),
        })
    }

    /// Reconstructs the insert statement for this tablet.
    ///
    /// The storage codec sorts the tablet's rows by timestamp before path
    /// derivation; see [`StorageCodec::decode_payload`].
    pub fn construct_statement<C: StorageCodec>(
        &self,
        codec: &C,
    ) -> Result<Statement<C::View, C::Path>, C::Error> {
        construct(codec, OperationKind::TabletRaw, &self.payload)
    }
}

fn construct<C: StorageCodec>(
    codec: &C,
    kind: OperationKind,
    payload: &[u8],
) -> Result<Statement<C::View, C::Path>, C::Error> {
    let operation = codec.decode_payload(kind, payload)?;
    let paths = codec.affected_paths(&operation);
    Ok(Statement { operation, paths })
}
