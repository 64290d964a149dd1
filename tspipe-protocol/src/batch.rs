//! Tablet batch aggregation.
//!
//! One envelope carrying many small mutations amortizes per-message
//! transport overhead. The body is three count-prefixed, length-prefixed
//! sequences concatenated in a fixed order:
//!
//! ```text
//! +---------------+---------------------+------------------+
//! | binary ops    | insert-node ops     | raw tablet ops   |
//! | count + items | count + items       | count + items    |
//! +---------------+---------------------+------------------+
//! ```
//!
//! Sub-items are bare operation payloads, not nested envelopes: the batch
//! envelope's own type tag already says what each sequence contains, so no
//! per-item version/type is re-encoded or re-validated. Order within each
//! sequence is preserved and must be replayed in encoded order; the three
//! sequences are independent of each other.

use crate::envelope::Envelope;
use crate::error::ProtocolError;
use crate::ops::{TabletBinaryReq, TabletInsertNodeReq, TabletRawReq};
use crate::types::RequestType;
use crate::wire;
use bytes::{BufMut, Bytes, BytesMut};

/// A batch of heterogeneous, already-encoded data operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabletBatchReq {
    pub binary_reqs: Vec<TabletBinaryReq>,
    pub insert_node_reqs: Vec<TabletInsertNodeReq>,
    pub tablet_reqs: Vec<TabletRawReq>,
}

impl TabletBatchReq {
    /// Builds a batch from three ordered sequences of operation payloads.
    pub fn new(
        binary_payloads: Vec<Bytes>,
        insert_node_payloads: Vec<Bytes>,
        tablet_payloads: Vec<Bytes>,
    ) -> Self {
        Self {
            binary_reqs: binary_payloads.into_iter().map(TabletBinaryReq::new).collect(),
            insert_node_reqs: insert_node_payloads
                .into_iter()
                .map(TabletInsertNodeReq::new)
                .collect(),
            tablet_reqs: tablet_payloads.into_iter().map(TabletRawReq::new).collect(),
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        let mut body = BytesMut::new();
        write_sequence(&mut body, self.binary_reqs.iter().map(|r| &r.payload));
        write_sequence(&mut body, self.insert_node_reqs.iter().map(|r| &r.payload));
        write_sequence(&mut body, self.tablet_reqs.iter().map(|r| &r.payload));
        Envelope::new(RequestType::TabletBatch as u16, body.freeze())
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        envelope.expect_type(RequestType::TabletBatch)?;
        let mut body = &envelope.body[..];

        let binary_reqs = read_sequence(&mut body)?
            .into_iter()
            .map(TabletBinaryReq::new)
            .collect();
        let insert_node_reqs = read_sequence(&mut body)?
            .into_iter()
            .map(TabletInsertNodeReq::new)
            .collect();
        let tablet_reqs = read_sequence(&mut body)?
            .into_iter()
            .map(TabletRawReq::new)
            .collect();

        Ok(Self {
            binary_reqs,
            insert_node_reqs,
            tablet_reqs,
        })
    }
}

fn write_sequence<'a>(buf: &mut BytesMut, items: impl ExactSizeIterator<Item = &'a Bytes>) {
    buf.put_u32(items.len() as u32);
    for item in items {
        wire::put_bytes(buf, item);
    }
}

fn read_sequence(buf: &mut &[u8]) -> Result<Vec<Bytes>, ProtocolError> {
    let count = wire::get_u32(buf)?;
    let mut items = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        let item = wire::get_bytes(buf).map_err(|err| match err {
            // Surface sub-sequence overruns as the batch-specific error.
            ProtocolError::DecodeError(_) => ProtocolError::TruncatedBatch {
                declared: count as usize,
                remaining: buf.len(),
            },
            other => other,
        })?;
        items.push(item);
    }
    Ok(items)
}
