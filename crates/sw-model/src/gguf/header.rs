use std::io::{Read, Write};

use crate::error::{ModelError, Result};
use super::io::{read_u32, read_u64};

/// The four-byte magic number identifying a GGUF file: ASCII "GGUF".
pub const GGUF_MAGIC: [u8; 4] = [0x47, 0x47, 0x55, 0x46];

/// The only container version we read and write.
pub const GGUF_VERSION: u32 = 3;

/// Default alignment (in bytes) for tensor data within a GGUF file.
pub const GGUF_DEFAULT_ALIGNMENT: usize = 32;

/// Parsed GGUF file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GgufHeader {
    pub version: u32,
    pub n_tensors: u64,
    pub n_kv: u64,
}

impl GgufHeader {
    /// Parse and validate a header from the beginning of a reader.
    pub fn parse(reader: &mut impl Read) -> Result<GgufHeader> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != GGUF_MAGIC {
            return Err(ModelError::InvalidMagic(magic));
        }

        let version = read_u32(reader)?;
        if version != GGUF_VERSION {
            return Err(ModelError::UnsupportedVersion(version));
        }

        let n_tensors = read_u64(reader)?;
        let n_kv = read_u64(reader)?;

        Ok(GgufHeader {
            version,
            n_tensors,
            n_kv,
        })
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&GGUF_MAGIC)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.n_tensors.to_le_bytes())?;
        writer.write_all(&self.n_kv.to_le_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_magic() {
        let bytes = b"GGML\x03\x00\x00\x00";
        let err = GgufHeader::parse(&mut &bytes[..]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidMagic(m) if &m == b"GGML"));
    }

    #[test]
    fn test_rejects_old_version() {
        let mut bytes = Vec::new();
        GgufHeader {
            version: 2,
            n_tensors: 0,
            n_kv: 0,
        }
        .write(&mut bytes)
        .unwrap();
        let err = GgufHeader::parse(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedVersion(2)));
    }
}
