//! Protocol version and request type registry.
//!
//! Type tags are stable once assigned: they are persisted implicitly in
//! replication logs and must remain backward-decodable. New kinds may be
//! added; unknown tags fail closed with [`ProtocolError::UnknownRequestType`]
//! rather than passing through as a default.

use crate::batch::TabletBatchReq;
use crate::envelope::Envelope;
use crate::error::ProtocolError;
use crate::handshake::{HandshakeV1Req, HandshakeV2Req};
use crate::ops::{SchemaPlanReq, TabletBinaryReq, TabletInsertNodeReq, TabletRawReq};
use crate::transfer::{
    FilePieceReq, FilePieceResp, FileSealReq, SnapshotPieceReq, SnapshotPieceResp, SnapshotSealReq,
};

/// Protocol dialect tag. Every message begins with this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolVersion {
    V1 = 1,
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProtocolVersion::V1),
            _ => Err(ProtocolError::UnknownVersion(value)),
        }
    }
}

/// Request/response kind, scoped within a protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RequestType {
    HandshakeV1 = 1,
    HandshakeV2 = 2,
    TabletBinary = 3,
    TabletInsertNode = 4,
    TabletRaw = 5,
    SchemaPlan = 6,
    TabletBatch = 7,
    FilePiece = 8,
    FileSeal = 9,
    SnapshotPiece = 10,
    SnapshotSeal = 11,
    FilePieceResponse = 12,
    SnapshotPieceResponse = 13,
}

impl TryFrom<u16> for RequestType {
    type Error = ProtocolError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RequestType::HandshakeV1),
            2 => Ok(RequestType::HandshakeV2),
            3 => Ok(RequestType::TabletBinary),
            4 => Ok(RequestType::TabletInsertNode),
            5 => Ok(RequestType::TabletRaw),
            6 => Ok(RequestType::SchemaPlan),
            7 => Ok(RequestType::TabletBatch),
            8 => Ok(RequestType::FilePiece),
            9 => Ok(RequestType::FileSeal),
            10 => Ok(RequestType::SnapshotPiece),
            11 => Ok(RequestType::SnapshotSeal),
            12 => Ok(RequestType::FilePieceResponse),
            13 => Ok(RequestType::SnapshotPieceResponse),
            _ => Err(ProtocolError::UnknownRequestType(value)),
        }
    }
}

/// A fully parsed pipe message, one variant per request/response kind.
///
/// [`PipeRequest::from_envelope`] is the single dispatch point: the match
/// over [`RequestType`] is exhaustive, so adding a kind without handling it
/// is a compile error, not a silent fallthrough.
#[derive(Debug, Clone, PartialEq)]
pub enum PipeRequest {
    HandshakeV1(HandshakeV1Req),
    HandshakeV2(HandshakeV2Req),
    TabletBinary(TabletBinaryReq),
    TabletInsertNode(TabletInsertNodeReq),
    TabletRaw(TabletRawReq),
    SchemaPlan(SchemaPlanReq),
    TabletBatch(TabletBatchReq),
    FilePiece(FilePieceReq),
    FileSeal(FileSealReq),
    SnapshotPiece(SnapshotPieceReq),
    SnapshotSeal(SnapshotSealReq),
    FilePieceResponse(FilePieceResp),
    SnapshotPieceResponse(SnapshotPieceResp),
}

impl PipeRequest {
    /// Parses an envelope into its typed request.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        match RequestType::try_from(envelope.request_type)? {
            RequestType::HandshakeV1 => {
                Ok(Self::HandshakeV1(HandshakeV1Req::from_envelope(envelope)?))
            }
            RequestType::HandshakeV2 => {
                Ok(Self::HandshakeV2(HandshakeV2Req::from_envelope(envelope)?))
            }
            RequestType::TabletBinary => {
                Ok(Self::TabletBinary(TabletBinaryReq::from_envelope(envelope)?))
            }
            RequestType::TabletInsertNode => Ok(Self::TabletInsertNode(
                TabletInsertNodeReq::from_envelope(envelope)?,
            )),
            RequestType::TabletRaw => Ok(Self::TabletRaw(TabletRawReq::from_envelope(envelope)?)),
            RequestType::SchemaPlan => {
                Ok(Self::SchemaPlan(SchemaPlanReq::from_envelope(envelope)?))
            }
            RequestType::TabletBatch => {
                Ok(Self::TabletBatch(TabletBatchReq::from_envelope(envelope)?))
            }
            RequestType::FilePiece => Ok(Self::FilePiece(FilePieceReq::from_envelope(envelope)?)),
            RequestType::FileSeal => Ok(Self::FileSeal(FileSealReq::from_envelope(envelope)?)),
            RequestType::SnapshotPiece => Ok(Self::SnapshotPiece(SnapshotPieceReq::from_envelope(
                envelope,
            )?)),
            RequestType::SnapshotSeal => Ok(Self::SnapshotSeal(SnapshotSealReq::from_envelope(
                envelope,
            )?)),
            RequestType::FilePieceResponse => Ok(Self::FilePieceResponse(
                FilePieceResp::from_envelope(envelope)?,
            )),
            RequestType::SnapshotPieceResponse => Ok(Self::SnapshotPieceResponse(
                SnapshotPieceResp::from_envelope(envelope)?,
            )),
        }
    }

    /// Returns the request type tag of this message.
    pub fn request_type(&self) -> RequestType {
        match self {
            PipeRequest::HandshakeV1(_) => RequestType::HandshakeV1,
            PipeRequest::HandshakeV2(_) => RequestType::HandshakeV2,
            PipeRequest::TabletBinary(_) => RequestType::TabletBinary,
            PipeRequest::TabletInsertNode(_) => RequestType::TabletInsertNode,
            PipeRequest::TabletRaw(_) => RequestType::TabletRaw,
            PipeRequest::SchemaPlan(_) => RequestType::SchemaPlan,
            PipeRequest::TabletBatch(_) => RequestType::TabletBatch,
            PipeRequest::FilePiece(_) => RequestType::FilePiece,
            PipeRequest::FileSeal(_) => RequestType::FileSeal,
            PipeRequest::SnapshotPiece(_) => RequestType::SnapshotPiece,
            PipeRequest::SnapshotSeal(_) => RequestType::SnapshotSeal,
            PipeRequest::FilePieceResponse(_) => RequestType::FilePieceResponse,
            PipeRequest::SnapshotPieceResponse(_) => RequestType::SnapshotPieceResponse,
        }
    }
}
