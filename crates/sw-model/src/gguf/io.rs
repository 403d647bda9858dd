use std::io::{Read, Write};

use crate::error::{ModelError, Result};

// Longest string accepted from a container.
const MAX_STRING_LEN: usize = 1 << 24;

pub(crate) fn read_u8(reader: &mut impl Read) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u16(reader: &mut impl Read) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_u32(reader: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64(reader: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a GGUF string: u64 length followed by that many UTF-8 bytes.
pub(crate) fn read_string(reader: &mut impl Read) -> Result<String> {
    let len = read_u64(reader)? as usize;
    if len > MAX_STRING_LEN {
        return Err(ModelError::Other(format!("string length {} exceeds limit", len)));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| ModelError::Other(format!("invalid UTF-8 in string: {}", e)))
}

pub(crate) fn write_string(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(&(s.len() as u64).to_le_bytes())?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

/// Round `offset` up to the next multiple of `alignment` (a power of two).
pub(crate) fn align_to(offset: usize, alignment: usize) -> usize {
    (offset + alignment - 1) & !(alignment - 1)
}
