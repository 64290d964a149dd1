//! Receiver-side request dispatch.
//!
//! [`PipeReceiver`] is the single entry point for inbound envelopes. It
//! enforces the handshake gate (data operations before a successful
//! handshake are rejected, not errored), tracks one [`ResourceWriter`] per
//! in-flight resource transfer, and forwards data payloads to an
//! [`OperationSink`] supplied by the embedding storage layer.
//!
//! Recoverable conditions travel back to the sender as statuses inside a
//! [`PipeResponse`]; only malformed input and local faults surface as
//! `Err`.

use crate::error::ReceiverError;
use crate::resource::ResourceWriter;
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use tspipe_protocol::{
    handshake::keys, Envelope, HandshakeV1Req, HandshakeV2Req, PieceReq, PieceResp, PipeRequest,
    SealReq, StatusCode, TransferResource, TransferStatus,
};

/// Destination for decoded data operations.
///
/// The receiver stays agnostic of tablet and plan-node layouts; payloads
/// cross this seam as the bytes they arrived in and the sink decodes them
/// with whatever storage codec it embeds.
pub trait OperationSink {
    type Error: Display;

    fn apply_binary(&self, payload: &[u8]) -> Result<(), Self::Error>;
    fn apply_insert_node(&self, payload: &[u8]) -> Result<(), Self::Error>;
    fn apply_schema_plan(&self, payload: &[u8]) -> Result<(), Self::Error>;
    fn apply_tablet(&self, payload: &[u8]) -> Result<(), Self::Error>;
}

/// Receiver configuration.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Directory where resource staging files and their metadata land.
    pub dir: PathBuf,
    /// Time precision this receiver stores data in, e.g. `"ms"`. A
    /// handshake declaring a different precision is rejected.
    pub time_precision: String,
}

/// Reply to one inbound envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum PipeResponse {
    /// Plain status reply.
    Status(TransferStatus),
    /// Piece acknowledgement for a data file transfer.
    FilePiece(tspipe_protocol::FilePieceResp),
    /// Piece acknowledgement for a snapshot transfer.
    SnapshotPiece(tspipe_protocol::SnapshotPieceResp),
}

impl PipeResponse {
    fn rejected(message: impl Into<String>) -> Self {
        Self::Status(TransferStatus::error(StatusCode::HandshakeRejected, message))
    }
}

/// Handles inbound pipe envelopes for one receiving node.
pub struct PipeReceiver<S> {
    config: ReceiverConfig,
    sink: S,
    handshaken: AtomicBool,
    peer_cluster: Mutex<Option<String>>,
    writers: RwLock<HashMap<String, ResourceWriter>>,
}

impl<S: OperationSink> PipeReceiver<S> {
    pub fn new(config: ReceiverConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            handshaken: AtomicBool::new(false),
            peer_cluster: Mutex::new(None),
            writers: RwLock::new(HashMap::new()),
        }
    }

    /// Cluster id the peer declared in its V2 handshake, if any.
    pub fn peer_cluster(&self) -> Option<String> {
        self.peer_cluster.lock().clone()
    }

    /// Whether a handshake has been accepted on this receiver.
    pub fn is_handshaken(&self) -> bool {
        self.handshaken.load(Ordering::Acquire)
    }

    /// Dispatches one envelope and produces the reply for the sender.
    pub fn handle(&self, envelope: &Envelope) -> Result<PipeResponse, ReceiverError> {
        match PipeRequest::from_envelope(envelope)? {
            PipeRequest::HandshakeV1(req) => Ok(self.handshake_v1(&req)),
            PipeRequest::HandshakeV2(req) => Ok(self.handshake_v2(&req)),
            PipeRequest::TabletBinary(req) => {
                self.data_op("binary", |s| s.apply_binary(&req.payload))
            }
            PipeRequest::TabletInsertNode(req) => {
                self.data_op("insert-node", |s| s.apply_insert_node(&req.payload))
            }
            PipeRequest::TabletRaw(req) => {
                self.data_op("tablet", |s| s.apply_tablet(&req.payload))
            }
            PipeRequest::SchemaPlan(req) => {
                self.data_op("schema-plan", |s| s.apply_schema_plan(&req.payload))
            }
            PipeRequest::TabletBatch(req) => {
                if !self.is_handshaken() {
                    return Ok(PipeResponse::rejected("handshake required"));
                }
                // Fixed order: binary, then insert-node, then tablet. The
                // whole batch stops at the first failing item.
                for item in &req.binary_reqs {
                    if let Err(status) = self.apply("binary", |s| s.apply_binary(&item.payload)) {
                        return Ok(PipeResponse::Status(status));
                    }
                }
                for item in &req.insert_node_reqs {
                    if let Err(status) =
                        self.apply("insert-node", |s| s.apply_insert_node(&item.payload))
                    {
                        return Ok(PipeResponse::Status(status));
                    }
                }
                for item in &req.tablet_reqs {
                    if let Err(status) = self.apply("tablet", |s| s.apply_tablet(&item.payload)) {
                        return Ok(PipeResponse::Status(status));
                    }
                }
                Ok(PipeResponse::Status(TransferStatus::ok()))
            }
            PipeRequest::FilePiece(req) => Ok(PipeResponse::FilePiece(self.handle_piece(&req))),
            PipeRequest::SnapshotPiece(req) => {
                Ok(PipeResponse::SnapshotPiece(self.handle_piece(&req)))
            }
            PipeRequest::FileSeal(req) => Ok(PipeResponse::Status(self.handle_seal(&req))),
            PipeRequest::SnapshotSeal(req) => Ok(PipeResponse::Status(self.handle_seal(&req))),
            // Piece responses only ever travel receiver-to-sender.
            PipeRequest::FilePieceResponse(_) => {
                Err(ReceiverError::UnexpectedMessage("file piece response"))
            }
            PipeRequest::SnapshotPieceResponse(_) => {
                Err(ReceiverError::UnexpectedMessage("snapshot piece response"))
            }
        }
    }

    fn handshake_v1(&self, req: &HandshakeV1Req) -> PipeResponse {
        self.accept_handshake(&req.time_precision, None)
    }

    fn handshake_v2(&self, req: &HandshakeV2Req) -> PipeResponse {
        let Some(precision) = req.get(keys::TIME_PRECISION) else {
            warn!("handshake rejected: no time precision declared");
            return PipeResponse::rejected("time_precision parameter required");
        };
        let cluster = req.get(keys::CLUSTER_ID).map(str::to_string);
        self.accept_handshake(precision, cluster)
    }

    fn accept_handshake(&self, precision: &str, cluster: Option<String>) -> PipeResponse {
        if precision != self.config.time_precision {
            warn!(
                got = precision,
                want = %self.config.time_precision,
                "handshake rejected: time precision mismatch"
            );
            return PipeResponse::rejected(format!(
                "time precision mismatch: receiver stores {}",
                self.config.time_precision
            ));
        }
        info!(precision, cluster = cluster.as_deref(), "handshake accepted");
        *self.peer_cluster.lock() = cluster;
        self.handshaken.store(true, Ordering::Release);
        PipeResponse::Status(TransferStatus::ok())
    }

    fn data_op(
        &self,
        kind: &'static str,
        op: impl FnOnce(&S) -> Result<(), S::Error>,
    ) -> Result<PipeResponse, ReceiverError> {
        if !self.is_handshaken() {
            return Ok(PipeResponse::rejected("handshake required"));
        }
        match self.apply(kind, op) {
            Ok(()) => Ok(PipeResponse::Status(TransferStatus::ok())),
            Err(status) => Ok(PipeResponse::Status(status)),
        }
    }

    fn apply(
        &self,
        kind: &'static str,
        op: impl FnOnce(&S) -> Result<(), S::Error>,
    ) -> Result<(), TransferStatus> {
        match op(&self.sink) {
            Ok(()) => {
                debug!(kind, "data operation applied");
                Ok(())
            }
            Err(err) => {
                warn!(kind, %err, "data operation failed");
                Err(TransferStatus::error(
                    StatusCode::InternalError,
                    err.to_string(),
                ))
            }
        }
    }

    fn handle_piece<R: TransferResource>(&self, req: &PieceReq<R>) -> PieceResp<R> {
        if !self.is_handshaken() {
            return PieceResp::new(
                TransferStatus::error(StatusCode::HandshakeRejected, "handshake required"),
                0,
            );
        }

        let mut writers = self.writers.write();
        let writer = match writers.entry(req.resource_name.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => match ResourceWriter::create(&self.config.dir, entry.key()) {
                Ok(writer) => entry.insert(writer),
                Err(err) => {
                    warn!(resource = %req.resource_name, %err, "cannot open staging file");
                    return PieceResp::new(
                        TransferStatus::error(StatusCode::InternalError, err.to_string()),
                        0,
                    );
                }
            },
        };

        match writer.write_piece(req.start_offset, &req.fragment) {
            Ok(confirmed) => {
                debug!(
                    resource = %req.resource_name,
                    offset = req.start_offset,
                    len = req.fragment.len(),
                    "piece written"
                );
                PieceResp::new(TransferStatus::ok(), confirmed)
            }
            Err(ReceiverError::AlreadySealed(_)) => {
                warn!(resource = %req.resource_name, "piece for sealed resource");
                PieceResp::new(
                    TransferStatus::error(
                        StatusCode::SealMismatch,
                        format!("{} is already sealed", req.resource_name),
                    ),
                    writer.confirmed_offset(),
                )
            }
            Err(ReceiverError::OffsetGap { expected, got, .. }) => {
                // Tell the sender where to resume from.
                warn!(
                    resource = %req.resource_name,
                    expected,
                    got,
                    "piece beyond confirmed offset"
                );
                PieceResp::new(
                    TransferStatus::error(
                        StatusCode::OffsetMismatch,
                        format!("expected offset {expected}, got {got}"),
                    ),
                    expected,
                )
            }
            Err(err) => {
                warn!(resource = %req.resource_name, %err, "piece write failed");
                PieceResp::new(
                    TransferStatus::error(StatusCode::InternalError, err.to_string()),
                    writer.confirmed_offset(),
                )
            }
        }
    }

    fn handle_seal<R: TransferResource>(&self, req: &SealReq<R>) -> TransferStatus {
        if !self.is_handshaken() {
            return TransferStatus::error(StatusCode::HandshakeRejected, "handshake required");
        }

        let mut writers = self.writers.write();
        let Some(writer) = writers.get_mut(&req.resource_name) else {
            warn!(resource = %req.resource_name, "seal for unknown resource");
            return TransferStatus::error(
                StatusCode::SealMismatch,
                format!("no pieces received for {}", req.resource_name),
            );
        };

        match writer.seal(req.total_length) {
            Ok(meta) => {
                // The writer stays in the table as a sealed tombstone so a
                // late or duplicate piece cannot recreate the staging file.
                info!(
                    resource = %req.resource_name,
                    length = meta.length,
                    crc32c = meta.crc32c,
                    "resource sealed"
                );
                TransferStatus::ok()
            }
            Err(ReceiverError::AlreadySealed(_)) => {
                warn!(resource = %req.resource_name, "seal for sealed resource");
                TransferStatus::error(
                    StatusCode::SealMismatch,
                    format!("{} is already sealed", req.resource_name),
                )
            }
            Err(ReceiverError::LengthMismatch {
                expected, actual, ..
            }) => {
                warn!(resource = %req.resource_name, expected, actual, "seal length mismatch");
                TransferStatus::error(
                    StatusCode::SealMismatch,
                    format!("declared {expected} bytes, staged {actual}"),
                )
            }
            Err(err) => {
                warn!(resource = %req.resource_name, %err, "seal failed");
                TransferStatus::error(StatusCode::InternalError, err.to_string())
            }
        }
    }

}
