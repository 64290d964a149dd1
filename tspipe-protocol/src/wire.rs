//! Shared wire field primitives.
//!
//! Every request body is built from a small set of fields:
//!
//! ```text
//! string field:  length (u32) || UTF-8 bytes
//! bytes field:   length (u32) || raw bytes
//! maybe-string:  present (u8) || [string field if present == 1]
//! ```
//!
//! All integers are big-endian. Readers are guarded: running past the end of
//! the buffer fails with a `DecodeError` instead of panicking.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Writes a length-prefixed UTF-8 string field.
pub fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

/// Reads a length-prefixed UTF-8 string field.
pub fn get_string(buf: &mut &[u8]) -> Result<String, ProtocolError> {
    let bytes = get_bytes(buf)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
}

/// Writes a length-prefixed bytes field.
pub fn put_bytes(buf: &mut BytesMut, b: &[u8]) {
    buf.put_u32(b.len() as u32);
    buf.put_slice(b);
}

/// Reads a length-prefixed bytes field.
pub fn get_bytes(buf: &mut &[u8]) -> Result<Bytes, ProtocolError> {
    let len = get_u32(buf)? as usize;
    if buf.remaining() < len {
        return Err(ProtocolError::decode(format!(
            "field declares {} bytes, {} remaining",
            len,
            buf.remaining()
        )));
    }
    Ok(buf.copy_to_bytes(len))
}

/// Writes a present/absent flag byte followed by the string if present.
///
/// Absence is a first-class wire state: `None` and `Some("")` encode
/// differently and must round-trip differently.
pub fn put_maybe_string(buf: &mut BytesMut, s: Option<&str>) {
    match s {
        Some(s) => {
            buf.put_u8(1);
            put_string(buf, s);
        }
        None => buf.put_u8(0),
    }
}

/// Reads a maybe-string field.
pub fn get_maybe_string(buf: &mut &[u8]) -> Result<Option<String>, ProtocolError> {
    match get_u8(buf)? {
        0 => Ok(None),
        1 => Ok(Some(get_string(buf)?)),
        flag => Err(ProtocolError::decode(format!(
            "invalid present flag: {flag}"
        ))),
    }
}

pub fn get_u8(buf: &mut &[u8]) -> Result<u8, ProtocolError> {
    ensure(*buf, 1)?;
    Ok(buf.get_u8())
}

pub fn get_u16(buf: &mut &[u8]) -> Result<u16, ProtocolError> {
    ensure(*buf, 2)?;
    Ok(buf.get_u16())
}

pub fn get_u32(buf: &mut &[u8]) -> Result<u32, ProtocolError> {
    ensure(*buf, 4)?;
    Ok(buf.get_u32())
}

pub fn get_u64(buf: &mut &[u8]) -> Result<u64, ProtocolError> {
    ensure(*buf, 8)?;
    Ok(buf.get_u64())
}

fn ensure(buf: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        return Err(ProtocolError::decode(format!(
            "need {} more bytes, {} remaining",
            needed,
            buf.len()
        )));
    }
    Ok(())
}
