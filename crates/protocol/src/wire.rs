//! Byte-level read primitives for SlimProto payloads
//!
//! Every multi-byte integer on the wire is big-endian and fixed width.
//! Each reader checks the cursor before consuming, so a short buffer
//! surfaces as [`ProtocolError::Truncated`] instead of a panic, and the
//! cursor is left untouched on failure.

use bytes::{Buf, Bytes};

use crate::error::{ProtocolError, Result};

/// Length of a message opcode on the wire.
pub const OPCODE_LEN: usize = 4;

fn ensure(buf: &Bytes, need: usize) -> Result<()> {
    if buf.remaining() < need {
        return Err(ProtocolError::Truncated {
            need,
            have: buf.remaining(),
        });
    }
    Ok(())
}

pub fn read_u8(buf: &mut Bytes) -> Result<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn read_u16(buf: &mut Bytes) -> Result<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16())
}

pub fn read_u32(buf: &mut Bytes) -> Result<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

pub fn read_u64(buf: &mut Bytes) -> Result<u64> {
    ensure(buf, 8)?;
    Ok(buf.get_u64())
}

/// Reads a fixed-size byte array off the cursor.
pub fn read_array<const N: usize>(buf: &mut Bytes) -> Result<[u8; N]> {
    ensure(buf, N)?;
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Reads exactly `len` bytes off the cursor.
pub fn read_bytes(buf: &mut Bytes, len: usize) -> Result<Bytes> {
    ensure(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}

/// Drains the rest of the cursor as a UTF-8 string.
pub fn read_string(buf: &mut Bytes) -> Result<String> {
    let rest = buf.copy_to_bytes(buf.remaining());
    String::from_utf8(rest.to_vec())
        .map_err(|_| ProtocolError::Malformed("invalid UTF-8 in string field".into()))
}
