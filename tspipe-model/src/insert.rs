//! Insert-node plan: one row of typed values for one device.
//!
//! Wire layout:
//!
//! ```text
//! device (string) || aligned (u8) || measurement count (u32)
//! || per measurement: name (string) + type (u8)
//! || timestamp (i64) || values (one per measurement, typed)
//! ```

use crate::error::ModelError;
use crate::path::Path;
use crate::types::{DataType, Value};
use bytes::{BufMut, Bytes, BytesMut};
use tspipe_protocol::wire;

/// A single-row insert operation.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRowNode {
    pub device: Path,
    pub is_aligned: bool,
    pub measurements: Vec<String>,
    pub data_types: Vec<DataType>,
    pub timestamp: i64,
    pub values: Vec<Value>,
}

impl InsertRowNode {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        wire::put_string(&mut buf, &self.device.to_string());
        buf.put_u8(self.is_aligned as u8);

        buf.put_u32(self.measurements.len() as u32);
        for (name, data_type) in self.measurements.iter().zip(&self.data_types) {
            wire::put_string(&mut buf, name);
            buf.put_u8(*data_type as u8);
        }

        buf.put_i64(self.timestamp);
        for value in &self.values {
            value.write(&mut buf);
        }
        buf.freeze()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, ModelError> {
        let mut buf = payload;
        let device = Path::parse(&wire::get_string(&mut buf)?);
        let is_aligned = match wire::get_u8(&mut buf)? {
            0 => false,
            1 => true,
            flag => return Err(ModelError::InvalidAlignedFlag(flag)),
        };

        // Cap pre-allocation; the count is unvalidated wire input.
        let count = wire::get_u32(&mut buf)? as usize;
        let mut measurements = Vec::with_capacity(count.min(1024));
        let mut data_types = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            measurements.push(wire::get_string(&mut buf)?);
            data_types.push(DataType::try_from(wire::get_u8(&mut buf)?)?);
        }

        let timestamp = wire::get_u64(&mut buf)? as i64;
        let mut values = Vec::with_capacity(count.min(1024));
        for data_type in &data_types {
            values.push(Value::read(*data_type, &mut buf)?);
        }
        if !buf.is_empty() {
            return Err(ModelError::TrailingBytes(buf.len()));
        }

        Ok(Self {
            device,
            is_aligned,
            measurements,
            data_types,
            timestamp,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_measurement_node() -> InsertRowNode {
        InsertRowNode {
            device: Path::parse("root.sg.d"),
            is_aligned: false,
            measurements: vec!["s".to_string()],
            data_types: vec![DataType::Int32],
            timestamp: 1,
            values: vec![Value::Int32(1)],
        }
    }

    #[test]
    fn test_insert_row_roundtrip() {
        let node = single_measurement_node();
        let decoded = InsertRowNode::decode(&node.encode()).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn test_insert_row_mixed_types() {
        let node = InsertRowNode {
            device: Path::parse("root.sg.d2"),
            is_aligned: true,
            measurements: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            data_types: vec![DataType::Double, DataType::Boolean, DataType::Text],
            timestamp: -42,
            values: vec![
                Value::Double(3.5),
                Value::Boolean(false),
                Value::Text("v".to_string()),
            ],
        };
        let decoded = InsertRowNode::decode(&node.encode()).unwrap();
        assert_eq!(decoded, node);
        assert_eq!(decoded.timestamp, -42);
    }

    #[test]
    fn test_truncated_payload() {
        let bytes = single_measurement_node().encode();
        assert!(InsertRowNode::decode(&bytes[..bytes.len() - 2]).is_err());
    }

    #[test]
    fn test_hostile_measurement_count() {
        // A count far beyond the payload must fail decode, not allocate.
        let mut buf = BytesMut::new();
        wire::put_string(&mut buf, "root.sg.d");
        buf.put_u8(0);
        buf.put_u32(u32::MAX);
        assert!(InsertRowNode::decode(&buf).is_err());
    }
}
