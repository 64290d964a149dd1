//! Alternate-transport envelope adapter.
//!
//! The air-gapped transport is a one-way byte stream with no structured RPC
//! envelope: version and type cannot ride as struct fields, so they are
//! written as a raw prefix ahead of the body — one byte of version, two
//! bytes of type, numerically identical to the standard envelope header.
//! An envelope parsed from an air-gap buffer is indistinguishable from one
//! built on the RPC path, keeping every downstream component
//! transport-agnostic.

use crate::envelope::Envelope;
use crate::error::ProtocolError;
use bytes::BytesMut;

/// Flattens an envelope into a raw air-gap transport buffer.
pub fn to_bytes(envelope: &Envelope) -> BytesMut {
    envelope.encode()
}

/// Reconstructs an envelope from a raw air-gap transport buffer.
pub fn from_bytes(buf: &[u8]) -> Result<Envelope, ProtocolError> {
    Envelope::decode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::{keys, HandshakeV2Req};
    use crate::types::{PipeRequest, ProtocolVersion, RequestType};
    use std::collections::HashMap;

    #[test]
    fn test_airgap_buffer_matches_rpc_path() {
        let mut params = HashMap::new();
        params.insert(keys::CLUSTER_ID.to_string(), Some("abcde".to_string()));
        params.insert(keys::TIME_PRECISION.to_string(), Some("ms".to_string()));
        params.insert("nullable".to_string(), None);

        let req = HandshakeV2Req::new(params.clone());
        let buf = to_bytes(&req.to_envelope());

        let envelope = from_bytes(&buf).unwrap();
        assert_eq!(envelope.version, ProtocolVersion::V1 as u8);
        assert_eq!(envelope.request_type, RequestType::HandshakeV2 as u16);

        // The reconstructed envelope dispatches like any RPC-path envelope.
        match PipeRequest::from_envelope(&envelope).unwrap() {
            PipeRequest::HandshakeV2(decoded) => assert_eq!(decoded.params, params),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_airgap_short_buffer() {
        assert!(matches!(
            from_bytes(&[1]),
            Err(ProtocolError::MalformedEnvelope { .. })
        ));
    }
}
