//! Chunked transfer of large files and snapshots.
//!
//! A resource (a data file or a snapshot artifact) is shipped as a stream
//! of offset-addressed pieces followed by one terminal seal:
//!
//! ```text
//! piece body:          name (string) || offset (8 bytes) || fragment (bytes)
//! piece response body: status || end offset (8 bytes)
//! seal body:           name (string) || total length (8 bytes)
//! ```
//!
//! The two resource kinds differ only in their request type tags and the
//! name their wire field carries; the algorithm is identical, so the
//! request types are generic over a [`TransferResource`] marker. This layer
//! transports offsets faithfully and never range-checks them: contiguity is
//! the receiver state machine's contract, and an explicit offset is what
//! makes out-of-order delivery detectable and resumable instead of silently
//! corrupting.

use crate::envelope::Envelope;
use crate::error::ProtocolError;
use crate::status::TransferStatus;
use crate::types::RequestType;
use crate::wire;
use bytes::{BufMut, Bytes, BytesMut};
use std::marker::PhantomData;

/// Marker for a chunked-transfer resource kind.
pub trait TransferResource {
    /// Tag for piece requests of this resource kind.
    const PIECE_TYPE: RequestType;
    /// Tag for the terminal seal request.
    const SEAL_TYPE: RequestType;
    /// Tag for piece responses.
    const PIECE_RESP_TYPE: RequestType;
    /// Name of the resource-name wire field, for diagnostics.
    const NAME_FIELD: &'static str;
}

/// A transferred data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsFileResource;

impl TransferResource for TsFileResource {
    const PIECE_TYPE: RequestType = RequestType::FilePiece;
    const SEAL_TYPE: RequestType = RequestType::FileSeal;
    const PIECE_RESP_TYPE: RequestType = RequestType::FilePieceResponse;
    const NAME_FIELD: &'static str = "file_name";
}

/// A transferred snapshot artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotResource;

impl TransferResource for SnapshotResource {
    const PIECE_TYPE: RequestType = RequestType::SnapshotPiece;
    const SEAL_TYPE: RequestType = RequestType::SnapshotSeal;
    const PIECE_RESP_TYPE: RequestType = RequestType::SnapshotPieceResponse;
    const NAME_FIELD: &'static str = "snapshot_name";
}

/// One offset-addressed fragment of a resource.
///
/// Zero-length fragments are legal; sealing an empty file sends one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceReq<R: TransferResource> {
    pub resource_name: String,
    pub start_offset: u64,
    pub fragment: Bytes,
    _resource: PhantomData<R>,
}

pub type FilePieceReq = PieceReq<TsFileResource>;
pub type SnapshotPieceReq = PieceReq<SnapshotResource>;

impl<R: TransferResource> PieceReq<R> {
    pub fn new(resource_name: impl Into<String>, start_offset: u64, fragment: Bytes) -> Self {
        Self {
            resource_name: resource_name.into(),
            start_offset,
            fragment,
            _resource: PhantomData,
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        let mut body = BytesMut::new();
        wire::put_string(&mut body, &self.resource_name);
        body.put_u64(self.start_offset);
        wire::put_bytes(&mut body, &self.fragment);
        Envelope::new(R::PIECE_TYPE as u16, body.freeze())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(R::PIECE_TYPE)?;
        let mut body = &envelope.body[..];
        let resource_name = wire::get_string(&mut body)?;
        let start_offset = wire::get_u64(&mut body)?;
        let fragment = wire::get_bytes(&mut body)?;
        Ok(Self {
            resource_name,
            start_offset,
            fragment,
            _resource: PhantomData,
        })
    }

    /// Offset one past the last byte this piece covers, saturating at
    /// `u64::MAX` for extreme offsets.
    pub fn end_offset(&self) -> u64 {
        self.start_offset.saturating_add(self.fragment.len() as u64)
    }
}

/// Terminal message for a resource: no more pieces will follow, and the
/// accumulated bytes are asserted to total `total_length`.
///
/// Enforcement of the assertion is the receiver's responsibility; this
/// layer only transports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealReq<R: TransferResource> {
    pub resource_name: String,
    pub total_length: u64,
    _resource: PhantomData<R>,
}

pub type FileSealReq = SealReq<TsFileResource>;
pub type SnapshotSealReq = SealReq<SnapshotResource>;

impl<R: TransferResource> SealReq<R> {
    pub fn new(resource_name: impl Into<String>, total_length: u64) -> Self {
        Self {
            resource_name: resource_name.into(),
            total_length,
            _resource: PhantomData,
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        let mut body = BytesMut::new();
        wire::put_string(&mut body, &self.resource_name);
        body.put_u64(self.total_length);
        Envelope::new(R::SEAL_TYPE as u16, body.freeze())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(R::SEAL_TYPE)?;
        let mut body = &envelope.body[..];
        let resource_name = wire::get_string(&mut body)?;
        let total_length = wire::get_u64(&mut body)?;
        Ok(Self {
            resource_name,
            total_length,
            _resource: PhantomData,
        })
    }
}

/// Acknowledgement for one piece.
///
/// `end_offset` is where the receiver has actually persisted up to; after a
/// partial failure the sender resumes from it instead of restarting the
/// whole resource.
#[derive(Debug, Clone, PartialEq)]
pub struct PieceResp<R: TransferResource> {
    pub status: TransferStatus,
    pub end_offset: u64,
    _resource: PhantomData<R>,
}

pub type FilePieceResp = PieceResp<TsFileResource>;
pub type SnapshotPieceResp = PieceResp<SnapshotResource>;

impl<R: TransferResource> PieceResp<R> {
    pub fn new(status: TransferStatus, end_offset: u64) -> Self {
        Self {
            status,
            end_offset,
            _resource: PhantomData,
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        let mut body = BytesMut::new();
        self.status.write(&mut body);
        body.put_u64(self.end_offset);
        Envelope::new(R::PIECE_RESP_TYPE as u16, body.freeze())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(R::PIECE_RESP_TYPE)?;
        let mut body = &envelope.body[..];
        let status = TransferStatus::read(&mut body)?;
        let end_offset = wire::get_u64(&mut body)?;
        Ok(Self {
            status,
            end_offset,
            _resource: PhantomData,
        })
    }
}

/// Splits a resource image into successive piece requests.
///
/// The caller chooses the chunk size; this layer puts no upper bound on
/// fragment size. An empty image yields a single zero-length piece so the
/// resource can still be sealed.
pub struct Chunker<'a, R: TransferResource> {
    resource_name: &'a str,
    data: &'a [u8],
    chunk_size: usize,
    offset: usize,
    done: bool,
    _resource: PhantomData<R>,
}

impl<'a, R: TransferResource> Chunker<'a, R> {
    pub fn new(resource_name: &'a str, data: &'a [u8], chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            resource_name,
            data,
            chunk_size,
            offset: 0,
            done: false,
            _resource: PhantomData,
        }
    }

    /// The seal request matching this resource image.
    pub fn seal(&self) -> SealReq<R> {
        SealReq::new(self.resource_name, self.data.len() as u64)
    }
}

impl<R: TransferResource> Iterator for Chunker<'_, R> {
    type Item = PieceReq<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let start = self.offset;
        let end = (start + self.chunk_size).min(self.data.len());
        self.offset = end;
        if end == self.data.len() {
            self.done = true;
        }
        Some(PieceReq::new(
            self.resource_name,
            start as u64,
            Bytes::copy_from_slice(&self.data[start..end]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;

    #[test]
    fn test_file_piece_roundtrip() {
        let fragment = Bytes::from_static(b"file piece transfer fragment!");
        assert_eq!(fragment.len(), 29);

        let req = FilePieceReq::new("1.tsfile", 0, fragment.clone());
        let decoded = FilePieceReq::from_envelope(&req.to_envelope()).unwrap();

        assert_eq!(decoded.resource_name, "1.tsfile");
        assert_eq!(decoded.start_offset, 0);
        assert_eq!(decoded.fragment, fragment);
        assert_eq!(decoded.end_offset(), 29);
    }

    #[test]
    fn test_snapshot_piece_roundtrip() {
        let req = SnapshotPieceReq::new("1.temp", 4096, Bytes::from_static(b"snap"));
        let decoded = SnapshotPieceReq::from_envelope(&req.to_envelope()).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_zero_length_fragment() {
        let req = FilePieceReq::new("empty.tsfile", 0, Bytes::new());
        let decoded = FilePieceReq::from_envelope(&req.to_envelope()).unwrap();
        assert!(decoded.fragment.is_empty());
        assert_eq!(decoded.end_offset(), 0);
    }

    #[test]
    fn test_seal_roundtrip() {
        let req = FileSealReq::new("1.tsfile", 100);
        let decoded = FileSealReq::from_envelope(&req.to_envelope()).unwrap();
        assert_eq!(decoded.resource_name, "1.tsfile");
        assert_eq!(decoded.total_length, 100);

        let snap = SnapshotSealReq::new("1.temp", 100);
        let decoded = SnapshotSealReq::from_envelope(&snap.to_envelope()).unwrap();
        assert_eq!(decoded, snap);
    }

    #[test]
    fn test_piece_resp_roundtrip() {
        let resp = FilePieceResp::new(TransferStatus::ok(), 100);
        let decoded = FilePieceResp::from_envelope(&resp.to_envelope()).unwrap();
        assert!(decoded.status.is_success());
        assert_eq!(decoded.end_offset, 100);

        let resp = SnapshotPieceResp::new(
            TransferStatus::error(StatusCode::OffsetMismatch, "resume from 64"),
            64,
        );
        let decoded = SnapshotPieceResp::from_envelope(&resp.to_envelope()).unwrap();
        assert_eq!(decoded.status.code, StatusCode::OffsetMismatch);
        assert_eq!(decoded.end_offset, 64);
    }

    #[test]
    fn test_file_and_snapshot_tags_differ() {
        let file = FilePieceReq::new("x", 0, Bytes::new()).to_envelope();
        let snap = SnapshotPieceReq::new("x", 0, Bytes::new()).to_envelope();
        assert_ne!(file.request_type, snap.request_type);

        assert!(matches!(
            FilePieceReq::from_envelope(&snap),
            Err(ProtocolError::UnexpectedRequestType { .. })
        ));
    }

    #[test]
    fn test_offset_transported_unchecked() {
        // An arbitrary large offset is carried unmodified; range checking
        // belongs to the receiver state machine.
        let req = FilePieceReq::new("big.tsfile", u64::MAX - 1, Bytes::from_static(b"x"));
        let decoded = FilePieceReq::from_envelope(&req.to_envelope()).unwrap();
        assert_eq!(decoded.start_offset, u64::MAX - 1);
        assert_eq!(decoded.end_offset(), u64::MAX);

        // end_offset saturates instead of overflowing.
        let req = FilePieceReq::new("big.tsfile", u64::MAX, Bytes::from_static(b"xy"));
        assert_eq!(req.end_offset(), u64::MAX);
    }

    #[test]
    fn test_chunker_covers_image() {
        let data = vec![7u8; 10];
        let chunker = Chunker::<TsFileResource>::new("f", &data, 4);
        let seal = chunker.seal();
        let pieces: Vec<_> = chunker.collect();

        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].start_offset, 0);
        assert_eq!(pieces[1].start_offset, 4);
        assert_eq!(pieces[2].start_offset, 8);
        assert_eq!(pieces[2].fragment.len(), 2);
        assert_eq!(seal.total_length, 10);

        let total: usize = pieces.iter().map(|p| p.fragment.len()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_chunker_empty_image() {
        let chunker = Chunker::<SnapshotResource>::new("s", &[], 8);
        let pieces: Vec<_> = chunker.collect();
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].fragment.is_empty());
        assert_eq!(pieces[0].start_offset, 0);
    }

    proptest::proptest! {
        #[test]
        fn prop_piece_roundtrip(
            name in "[a-z0-9._-]{1,40}",
            offset in proptest::prelude::any::<u64>(),
            fragment in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..512),
        ) {
            let req = FilePieceReq::new(name, offset, Bytes::from(fragment));
            let decoded = FilePieceReq::from_envelope(&req.to_envelope()).unwrap();
            proptest::prop_assert_eq!(decoded, req);
        }

        #[test]
        fn prop_seal_roundtrip(name in "[a-z0-9._-]{1,40}", len in proptest::prelude::any::<u64>()) {
            let req = SnapshotSealReq::new(name, len);
            let decoded = SnapshotSealReq::from_envelope(&req.to_envelope()).unwrap();
            proptest::prop_assert_eq!(decoded, req);
        }
    }
}
