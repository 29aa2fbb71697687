//! Bounds-checked readers and writers for positional little-endian fields.
//!
//! `bytes::Buf` getters panic on short input; everything read off the wire goes
//! through these helpers instead so truncation surfaces as an
//! [`EnvelopeDecodeError`].

use crate::envelope::{EnvelopeDecodeError, EnvelopeEncodeError};
use bytes::{Buf, BufMut, BytesMut};

#[inline]
fn ensure(buf: &[u8], needed: usize) -> Result<(), EnvelopeDecodeError> {
    if buf.len() < needed {
        return Err(EnvelopeDecodeError::IncompleteBody {
            needed,
            actual: buf.len(),
        });
    }
    Ok(())
}

pub fn read_u8(buf: &mut &[u8]) -> Result<u8, EnvelopeDecodeError> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn read_bool(buf: &mut &[u8]) -> Result<bool, EnvelopeDecodeError> {
    Ok(read_u8(buf)? != 0)
}

pub fn read_u16(buf: &mut &[u8]) -> Result<u16, EnvelopeDecodeError> {
    ensure(buf, 2)?;
    Ok(buf.get_u16_le())
}

pub fn read_u32(buf: &mut &[u8]) -> Result<u32, EnvelopeDecodeError> {
    ensure(buf, 4)?;
    Ok(buf.get_u32_le())
}

pub fn read_i32(buf: &mut &[u8]) -> Result<i32, EnvelopeDecodeError> {
    ensure(buf, 4)?;
    Ok(buf.get_i32_le())
}

pub fn read_u64(buf: &mut &[u8]) -> Result<u64, EnvelopeDecodeError> {
    ensure(buf, 8)?;
    Ok(buf.get_u64_le())
}

pub fn read_bytes<const N: usize>(buf: &mut &[u8]) -> Result<[u8; N], EnvelopeDecodeError> {
    ensure(buf, N)?;
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Reads a `u16` length-prefixed UTF-8 string.
pub fn read_string(buf: &mut &[u8]) -> Result<String, EnvelopeDecodeError> {
    let len = read_u16(buf)? as usize;
    ensure(buf, len)?;
    let (text, rest) = buf.split_at(len);
    let text = std::str::from_utf8(text)
        .map_err(|e| EnvelopeDecodeError::corrupt_body(format!("invalid UTF-8 string: {e}")))?
        .to_owned();
    *buf = rest;
    Ok(text)
}

/// Writes a `u16` length-prefixed UTF-8 string.
pub fn write_string(
    buf: &mut BytesMut,
    field: &'static str,
    text: &str,
) -> Result<(), EnvelopeEncodeError> {
    let len = u16::try_from(text.len()).map_err(|_| EnvelopeEncodeError::FieldTooLong {
        field,
        len: text.len(),
        max: u16::MAX as usize,
    })?;
    buf.put_u16_le(len);
    buf.put_slice(text.as_bytes());
    Ok(())
}
