//! Handshake negotiation requests.
//!
//! Two protocol generations coexist. V1 carries a single scalar parameter
//! (the sender's time precision). V2 generalizes it to an open key-value
//! parameter map so new capabilities can be negotiated without bumping the
//! overall protocol version. A decoder tells them apart purely by the
//! request type tag, never by body shape.

use crate::envelope::Envelope;
use crate::error::ProtocolError;
use crate::types::RequestType;
use crate::wire;
use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

/// Well-known V2 parameter keys.
///
/// Unknown keys must be preserved by both sides for forward compatibility.
pub mod keys {
    /// Identity of the sending cluster.
    pub const CLUSTER_ID: &str = "cluster_id";
    /// Time precision unit of the sending cluster ("ms", "us" or "ns").
    pub const TIME_PRECISION: &str = "time_precision";
}

/// V1 handshake: body is exactly one length-prefixed time precision string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeV1Req {
    pub time_precision: String,
}

impl HandshakeV1Req {
    pub fn new(time_precision: impl Into<String>) -> Self {
        Self {
            time_precision: time_precision.into(),
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        let mut body = BytesMut::new();
        wire::put_string(&mut body, &self.time_precision);
        Envelope::new(RequestType::HandshakeV1 as u16, body.freeze())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(RequestType::HandshakeV1)?;
        let mut body = &envelope.body[..];
        let time_precision = wire::get_string(&mut body)?;
        Ok(Self { time_precision })
    }
}

/// V2 handshake: body is a count-prefixed sequence of `(key, maybe-value)`
/// pairs.
///
/// A value may be absent; absence round-trips as absence, distinct from an
/// empty string. Entry order on the wire is the map's iteration order and
/// carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeV2Req {
    pub params: HashMap<String, Option<String>>,
}

impl HandshakeV2Req {
    pub fn new(params: HashMap<String, Option<String>>) -> Self {
        Self { params }
    }

    pub fn to_envelope(&self) -> Envelope {
        let mut body = BytesMut::new();
        body.put_u32(self.params.len() as u32);
        for (key, value) in &self.params {
            wire::put_string(&mut body, key);
            wire::put_maybe_string(&mut body, value.as_deref());
        }
        Envelope::new(RequestType::HandshakeV2 as u16, body.freeze())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(RequestType::HandshakeV2)?;
        let mut body = &envelope.body[..];
        let count = wire::get_u32(&mut body)?;

        // The declared count is unvalidated wire input; cap the
        // pre-allocation and let the entry loop hit the real end of buffer.
        let mut params = HashMap::with_capacity(count.min(64) as usize);
        for _ in 0..count {
            let key = wire::get_string(&mut body)?;
            let value = wire::get_maybe_string(&mut body)?;
            params.insert(key, value);
        }
        Ok(Self { params })
    }

    /// Convenience accessor for a present parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_v1_roundtrip() {
        let req = HandshakeV1Req::new("ms");
        let envelope = req.to_envelope();
        let decoded = HandshakeV1Req::from_envelope(&envelope).unwrap();

        assert_eq!(envelope.request_type, RequestType::HandshakeV1 as u16);
        assert_eq!(decoded, req);
        // Re-encoding an inbound request reproduces the same bytes.
        assert_eq!(decoded.to_envelope().body, envelope.body);
    }

    #[test]
    fn test_handshake_v1_rejects_garbage_body() {
        let envelope = Envelope::new(RequestType::HandshakeV1 as u16, bytes::Bytes::from_static(&[0, 0]));
        assert!(HandshakeV1Req::from_envelope(&envelope).is_err());
    }

    #[test]
    fn test_handshake_v2_roundtrip() {
        let mut params = HashMap::new();
        params.insert(keys::CLUSTER_ID.to_string(), Some("abcde".to_string()));
        params.insert(keys::TIME_PRECISION.to_string(), Some("ms".to_string()));
        params.insert("nullable".to_string(), None);
        params.insert("empty".to_string(), Some(String::new()));

        let req = HandshakeV2Req::new(params.clone());
        let decoded = HandshakeV2Req::from_envelope(&req.to_envelope()).unwrap();

        assert_eq!(decoded.params, params);
        // Absent stays absent; empty stays empty.
        assert_eq!(decoded.params.get("nullable"), Some(&None));
        assert_eq!(decoded.params.get("empty"), Some(&Some(String::new())));
        assert_eq!(decoded.get(keys::CLUSTER_ID), Some("abcde"));
        assert_eq!(decoded.get("nullable"), None);
    }

    #[test]
    fn test_handshake_v2_empty_map() {
        let req = HandshakeV2Req::new(HashMap::new());
        let decoded = HandshakeV2Req::from_envelope(&req.to_envelope()).unwrap();
        assert!(decoded.params.is_empty());
    }

    #[test]
    fn test_v1_and_v2_distinguished_by_tag() {
        let v1 = HandshakeV1Req::new("ms").to_envelope();
        let v2 = HandshakeV2Req::new(HashMap::new()).to_envelope();
        assert_ne!(v1.request_type, v2.request_type);

        // Feeding a V2 envelope to the V1 parser fails on the tag check.
        assert!(matches!(
            HandshakeV1Req::from_envelope(&v2),
            Err(ProtocolError::UnexpectedRequestType { .. })
        ));
    }

    #[test]
    fn test_handshake_v2_truncated_entry() {
        let mut body = BytesMut::new();
        body.put_u32(2);
        wire::put_string(&mut body, "only_key");
        // Second entry missing entirely.
        body.put_u8(1);
        let envelope = Envelope::new(RequestType::HandshakeV2 as u16, body.freeze());
        assert!(HandshakeV2Req::from_envelope(&envelope).is_err());
    }

    #[test]
    fn test_handshake_v2_hostile_count() {
        // A count far beyond the body must fail decode, not allocate.
        let mut body = BytesMut::new();
        body.put_u32(u32::MAX);
        let envelope = Envelope::new(RequestType::HandshakeV2 as u16, body.freeze());
        assert!(HandshakeV2Req::from_envelope(&envelope).is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_v2_params_roundtrip(
            params in proptest::collection::hash_map(
                "[a-zA-Z_][a-zA-Z0-9_]{0,20}",
                proptest::option::of("[ -~]{0,32}"),
                0..8,
            ),
        ) {
            let req = HandshakeV2Req::new(params.clone());
            let decoded = HandshakeV2Req::from_envelope(&req.to_envelope()).unwrap();
            proptest::prop_assert_eq!(decoded.params, params);
        }
    }
}
