//! # tspipe-protocol
//!
//! Wire protocol for the tspipe replication pathway: the envelope framing,
//! handshake negotiation, batched data transfer, and resumable chunked
//! file/snapshot transfer exchanged between a source and a destination
//! node of a time-series database.
//!
//! This crate provides:
//! - The `(version, type, body)` envelope codec and the air-gap adapter
//!   that reframes it for raw byte-stream transports
//! - The request type registry and the closed [`PipeRequest`] dispatch union
//! - Handshake V1/V2 negotiation requests
//! - Data operation requests around opaque storage-layer payloads
//! - Batch aggregation of heterogeneous sub-requests
//! - Offset-addressed piece/seal chunked transfer with piece responses
//!
//! The crate is pure computation: no I/O, no async, no shared mutable
//! state. Every encode/decode operates solely on its arguments and returns
//! a fresh value, so all types are safe to use concurrently.

pub mod airgap;
pub mod batch;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod handshake;
pub mod ops;
pub mod status;
pub mod transfer;
pub mod types;
pub mod wire;

pub use batch::TabletBatchReq;
pub use codec::{OperationKind, Statement, StorageCodec};
pub use envelope::{Envelope, ENVELOPE_HEADER_SIZE};
pub use error::ProtocolError;
pub use handshake::{HandshakeV1Req, HandshakeV2Req};
pub use ops::{SchemaPlanReq, TabletBinaryReq, TabletInsertNodeReq, TabletRawReq};
pub use status::{StatusCode, TransferStatus};
pub use transfer::{
    Chunker, FilePieceReq, FilePieceResp, FileSealReq, PieceReq, PieceResp, SealReq,
    SnapshotPieceReq, SnapshotPieceResp, SnapshotSealReq, SnapshotResource, TransferResource,
    TsFileResource,
};
pub use types::{PipeRequest, ProtocolVersion, RequestType};
