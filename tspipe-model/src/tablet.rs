//! Columnar raw tabular data.
//!
//! A tablet holds a window of rows for one device: a timestamp vector and
//! one optional-cell vector per measurement column. Column insertion order
//! is preserved end to end; statement construction reports affected paths
//! in that order.
//!
//! Wire layout:
//!
//! ```text
//! device (string) || column count (u32) || columns: name (string) + type (u8)
//! || row count (u32) || timestamps (row count * i64)
//! || per column: cells (present u8 + [value])
//! ```

use crate::error::ModelError;
use crate::path::Path;
use crate::types::{DataType, Value};
use bytes::{BufMut, Bytes, BytesMut};
use tspipe_protocol::wire;

/// Schema of one measurement column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A window of rows for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Tablet {
    pub device: Path,
    columns: Vec<ColumnSchema>,
    timestamps: Vec<i64>,
    /// Parallel to `columns`; each inner vector is parallel to `timestamps`.
    cells: Vec<Vec<Option<Value>>>,
}

impl Tablet {
    pub fn new(device: Path, columns: Vec<ColumnSchema>) -> Self {
        let cells = columns.iter().map(|_| Vec::new()).collect();
        Self {
            device,
            columns,
            timestamps: Vec::new(),
            cells,
        }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn row_count(&self) -> usize {
        self.timestamps.len()
    }

    /// Appends one row. `row` must provide one cell per column, in column
    /// order; a `None` cell marks the measurement absent for this row.
    pub fn push_row(&mut self, timestamp: i64, row: Vec<Option<Value>>) -> Result<(), ModelError> {
        if row.len() != self.columns.len() {
            return Err(ModelError::ColumnCountMismatch {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        for (column, cell) in self.columns.iter().zip(&row) {
            if let Some(value) = cell {
                if value.data_type() != column.data_type {
                    return Err(ModelError::ValueTypeMismatch {
                        column: column.name.clone(),
                        expected: column.data_type,
                        got: value.data_type(),
                    });
                }
            }
        }

        self.timestamps.push(timestamp);
        for (column_cells, cell) in self.cells.iter_mut().zip(row) {
            column_cells.push(cell);
        }
        Ok(())
    }

    /// Returns the cell at (column name, row), if the column exists and the
    /// cell is present.
    pub fn value(&self, column: &str, row: usize) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c.name == column)?;
        self.cells[idx].get(row)?.as_ref()
    }

    /// Sorts rows by timestamp, ascending.
    ///
    /// The sort is stable: rows with equal timestamps keep their original
    /// insertion order. Downstream statement construction assumes
    /// timestamp-ordered rows.
    pub fn sort_by_timestamp(&mut self) {
        let mut order: Vec<usize> = (0..self.timestamps.len()).collect();
        order.sort_by_key(|&i| self.timestamps[i]);

        self.timestamps = order.iter().map(|&i| self.timestamps[i]).collect();
        for column_cells in &mut self.cells {
            *column_cells = order.iter().map(|&i| column_cells[i].take()).collect();
        }
    }

    /// Encodes the tablet image alone (no aligned flag).
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        wire::put_string(&mut buf, &self.device.to_string());

        buf.put_u32(self.columns.len() as u32);
        for column in &self.columns {
            wire::put_string(&mut buf, &column.name);
            buf.put_u8(column.data_type as u8);
        }

        buf.put_u32(self.timestamps.len() as u32);
        for ts in &self.timestamps {
            buf.put_i64(*ts);
        }

        for column_cells in &self.cells {
            for cell in column_cells {
                match cell {
                    Some(value) => {
                        buf.put_u8(1);
                        value.write(&mut buf);
                    }
                    None => buf.put_u8(0),
                }
            }
        }
        buf.freeze()
    }

    /// Decodes a tablet image alone, consuming from `buf`.
    pub fn decode(buf: &mut &[u8]) -> Result<Self, ModelError> {
        let device = Path::parse(&wire::get_string(buf)?);

        // Counts are unvalidated wire input; cap pre-allocations and let
        // the read loops hit the real end of buffer.
        let column_count = wire::get_u32(buf)? as usize;
        let mut columns = Vec::with_capacity(column_count.min(1024));
        for _ in 0..column_count {
            let name = wire::get_string(buf)?;
            let data_type = DataType::try_from(wire::get_u8(buf)?)?;
            columns.push(ColumnSchema { name, data_type });
        }

        let row_count = wire::get_u32(buf)? as usize;
        let mut timestamps = Vec::with_capacity(row_count.min(1024));
        for _ in 0..row_count {
            timestamps.push(wire::get_u64(buf)? as i64);
        }

        let mut cells = Vec::with_capacity(column_count.min(1024));
        for column in &columns {
            let mut column_cells = Vec::with_capacity(row_count.min(1024));
            for _ in 0..row_count {
                match wire::get_u8(buf)? {
                    0 => column_cells.push(None),
                    1 => column_cells.push(Some(Value::read(column.data_type, buf)?)),
                    flag => return Err(ModelError::InvalidPresenceFlag(flag)),
                }
            }
            cells.push(column_cells);
        }

        Ok(Self {
            device,
            columns,
            timestamps,
            cells,
        })
    }

    /// Encodes the raw-tablet operation payload: tablet image followed by
    /// the aligned flag byte.
    pub fn to_pipe_bytes(&self, is_aligned: bool) -> Bytes {
        let image = self.encode();
        let mut buf = BytesMut::with_capacity(image.len() + 1);
        buf.put_slice(&image);
        buf.put_u8(is_aligned as u8);
        buf.freeze()
    }

    /// Decodes a raw-tablet operation payload into the tablet and its
    /// aligned flag, rejecting trailing bytes.
    pub fn from_pipe_bytes(payload: &[u8]) -> Result<(Self, bool), ModelError> {
        let mut buf = payload;
        let tablet = Tablet::decode(&mut buf)?;
        let is_aligned = match wire::get_u8(&mut buf)? {
            0 => false,
            1 => true,
            flag => return Err(ModelError::InvalidAlignedFlag(flag)),
        };
        if !buf.is_empty() {
            return Err(ModelError::TrailingBytes(buf.len()));
        }
        Ok((tablet, is_aligned))
    }
}
