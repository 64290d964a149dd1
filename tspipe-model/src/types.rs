//! Measurement data types and typed values.

use crate::error::ModelError;
use bytes::{BufMut, BytesMut};
use tspipe_protocol::wire;

/// Data type of a measurement column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    Boolean = 0,
    Int32 = 1,
    Int64 = 2,
    Float = 3,
    Double = 4,
    Text = 5,
}

impl TryFrom<u8> for DataType {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DataType::Boolean),
            1 => Ok(DataType::Int32),
            2 => Ok(DataType::Int64),
            3 => Ok(DataType::Float),
            4 => Ok(DataType::Double),
            5 => Ok(DataType::Text),
            _ => Err(ModelError::UnknownDataType(value)),
        }
    }
}

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Text(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::Text(_) => DataType::Text,
        }
    }

    /// Writes the value without a type tag; the reader knows the column's
    /// declared type.
    pub(crate) fn write(&self, buf: &mut BytesMut) {
        match self {
            Value::Boolean(v) => buf.put_u8(*v as u8),
            Value::Int32(v) => buf.put_i32(*v),
            Value::Int64(v) => buf.put_i64(*v),
            Value::Float(v) => buf.put_f32(*v),
            Value::Double(v) => buf.put_f64(*v),
            Value::Text(v) => wire::put_string(buf, v),
        }
    }

    /// Reads a value of the given declared type.
    pub(crate) fn read(data_type: DataType, buf: &mut &[u8]) -> Result<Self, ModelError> {
        Ok(match data_type {
            DataType::Boolean => Value::Boolean(wire::get_u8(buf)? != 0),
            DataType::Int32 => Value::Int32(wire::get_u32(buf)? as i32),
            DataType::Int64 => Value::Int64(wire::get_u64(buf)? as i64),
            DataType::Float => Value::Float(f32::from_bits(wire::get_u32(buf)?)),
            DataType::Double => Value::Double(f64::from_bits(wire::get_u64(buf)?)),
            DataType::Text => Value::Text(wire::get_string(buf)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_conversion() {
        for tag in 0u8..=5 {
            let dt = DataType::try_from(tag).unwrap();
            assert_eq!(dt as u8, tag);
        }
        assert!(matches!(
            DataType::try_from(6u8),
            Err(ModelError::UnknownDataType(6))
        ));
    }

    #[test]
    fn test_value_roundtrip_all_types() {
        let values = [
            Value::Boolean(true),
            Value::Int32(-7),
            Value::Int64(1_000_000_007),
            Value::Float(1.25),
            Value::Double(-2.5),
            Value::Text("hello".to_string()),
        ];

        for value in values {
            let mut buf = BytesMut::new();
            value.write(&mut buf);
            let mut slice = &buf[..];
            let decoded = Value::read(value.data_type(), &mut slice).unwrap();
            assert_eq!(decoded, value);
            assert!(slice.is_empty());
        }
    }
}
