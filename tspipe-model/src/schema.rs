//! Schema plan: create time series under a device.
//!
//! Wire layout:
//!
//! ```text
//! device (string) || aligned (u8) || measurement count (u32)
//! || per measurement: name (string) + type (u8)
//! ```

use crate::error::ModelError;
use crate::path::Path;
use crate::types::DataType;
use bytes::{BufMut, Bytes, BytesMut};
use tspipe_protocol::wire;

/// A create-time-series schema operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPlanNode {
    pub device: Path,
    pub is_aligned: bool,
    pub measurements: Vec<String>,
    pub data_types: Vec<DataType>,
}

impl SchemaPlanNode {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        wire::put_string(&mut buf, &self.device.to_string());
        buf.put_u8(self.is_aligned as u8);

        buf.put_u32(self.measurements.len() as u32);
        for (name, data_type) in self.measurements.iter().zip(&self.data_types) {
            wire::put_string(&mut buf, name);
            buf.put_u8(*data_type as u8);
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
        if !buf.is_empty() {
            return Err(ModelError::TrailingBytes(buf.len()));
        }

        Ok(Self {
            device,
            is_aligned,
            measurements,
            data_types,
        })
    }
}
