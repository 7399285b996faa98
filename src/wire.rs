//! Wire-format primitives
//!
//! Stateless read/write helpers shared by every column codec: unsigned
//! LEB128 varints and varint-length-prefixed byte strings. Fixed-width
//! primitives are read and written through
//! [`columns::numeric::Primitive`](crate::columns::numeric::Primitive);
//! everything on the wire is little-endian.

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::{BlockError, Result};

/// Longest legal varint encoding of a u64.
pub const MAX_VARINT_LEN: usize = 10;

/// Reads an unsigned LEB128 varint: 7-bit groups, lowest first,
/// continuation bit 0x80.
pub fn read_varint<R: Read>(input: &mut R) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let byte = input.read_u8()?;
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(BlockError::Protocol(format!(
        "varint longer than {} bytes",
        MAX_VARINT_LEN
    )))
}

/// Writes an unsigned LEB128 varint.
pub fn write_varint<W: Write>(output: &mut W, mut value: u64) -> Result<()> {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        output.write_u8(byte)?;
        if value == 0 {
            return Ok(());
        }
    }
}

/// Reads a varint length followed by that many raw bytes into `out`,
/// replacing its content. The buffer's allocation is reused.
pub fn read_string_into<R: Read>(input: &mut R, out: &mut Vec<u8>) -> Result<()> {
    let len = read_varint(input)? as usize;
    out.clear();
    out.resize(len, 0);
    input.read_exact(out)?;
    Ok(())
}

/// Reads a varint length followed by that many raw bytes.
pub fn read_string<R: Read>(input: &mut R) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    read_string_into(input, &mut out)?;
    Ok(out)
}

/// Writes a varint length followed by the raw bytes.
pub fn write_string<W: Write>(output: &mut W, bytes: &[u8]) -> Result<()> {
    write_varint(output, bytes.len() as u64)?;
    output.write_all(bytes)?;
    Ok(())
}

/// Fills `buf` with exactly `buf.len()` bytes from the stream.
pub fn read_bytes<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<()> {
    input.read_exact(buf)?;
    Ok(())
}

/// Writes `buf` in full.
pub fn write_bytes<W: Write>(output: &mut W, buf: &[u8]) -> Result<()> {
    output.write_all(buf)?;
    Ok(())
}
