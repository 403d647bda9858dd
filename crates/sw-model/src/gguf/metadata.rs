use std::collections::HashMap;
use std::io::{Read, Write};

use crate::error::{ModelError, Result};
use super::io::{read_string, read_u16, read_u32, read_u64, read_u8, write_string};

/// A single GGUF metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum GgufMetadataValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Array(Vec<GgufMetadataValue>),
}

impl GgufMetadataValue {
    fn type_name(&self) -> &'static str {
        match self {
            GgufMetadataValue::U8(_) => "U8",
            GgufMetadataValue::I8(_) => "I8",
            GgufMetadataValue::U16(_) => "U16",
            GgufMetadataValue::I16(_) => "I16",
            GgufMetadataValue::U32(_) => "U32",
            GgufMetadataValue::I32(_) => "I32",
            GgufMetadataValue::U64(_) => "U64",
            GgufMetadataValue::I64(_) => "I64",
            GgufMetadataValue::F32(_) => "F32",
            GgufMetadataValue::F64(_) => "F64",
            GgufMetadataValue::Bool(_) => "Bool",
            GgufMetadataValue::String(_) => "String",
            GgufMetadataValue::Array(_) => "Array",
        }
    }

    /// GGUF value type IDs:
    ///   0=U8, 1=I8, 2=U16, 3=I16, 4=U32, 5=I32, 6=F32, 7=Bool,
    ///   8=String, 9=Array, 10=U64, 11=I64, 12=F64
    fn type_id(&self) -> u32 {
        match self {
            GgufMetadataValue::U8(_) => 0,
            GgufMetadataValue::I8(_) => 1,
            GgufMetadataValue::U16(_) => 2,
            GgufMetadataValue::I16(_) => 3,
            GgufMetadataValue::U32(_) => 4,
            GgufMetadataValue::I32(_) => 5,
            GgufMetadataValue::F32(_) => 6,
            GgufMetadataValue::Bool(_) => 7,
            GgufMetadataValue::String(_) => 8,
            GgufMetadataValue::Array(_) => 9,
            GgufMetadataValue::U64(_) => 10,
            GgufMetadataValue::I64(_) => 11,
            GgufMetadataValue::F64(_) => 12,
        }
    }

    fn read(reader: &mut impl Read, type_id: u32) -> Result<GgufMetadataValue> {
        let value = match type_id {
            0 => GgufMetadataValue::U8(read_u8(reader)?),
            1 => GgufMetadataValue::I8(read_u8(reader)? as i8),
            2 => GgufMetadataValue::U16(read_u16(reader)?),
            3 => GgufMetadataValue::I16(read_u16(reader)? as i16),
            4 => GgufMetadataValue::U32(read_u32(reader)?),
            5 => GgufMetadataValue::I32(read_u32(reader)? as i32),
            6 => GgufMetadataValue::F32(f32::from_bits(read_u32(reader)?)),
            7 => GgufMetadataValue::Bool(read_u8(reader)? != 0),
            8 => GgufMetadataValue::String(read_string(reader)?),
            9 => {
                let elem_type = read_u32(reader)?;
                let count = read_u64(reader)? as usize;
                let mut values = Vec::with_capacity(count.min(1 << 16));
                for _ in 0..count {
                    values.push(GgufMetadataValue::read(reader, elem_type)?);
                }
                GgufMetadataValue::Array(values)
            }
            10 => GgufMetadataValue::U64(read_u64(reader)?),
            11 => GgufMetadataValue::I64(read_u64(reader)? as i64),
            12 => GgufMetadataValue::F64(f64::from_bits(read_u64(reader)?)),
            other => return Err(ModelError::UnsupportedGgufType(other)),
        };
        Ok(value)
    }

    fn write_payload(&self, writer: &mut impl Write) -> Result<()> {
        match self {
            GgufMetadataValue::U8(v) => writer.write_all(&[*v])?,
            GgufMetadataValue::I8(v) => writer.write_all(&v.to_le_bytes())?,
            GgufMetadataValue::U16(v) => writer.write_all(&v.to_le_bytes())?,
            GgufMetadataValue::I16(v) => writer.write_all(&v.to_le_bytes())?,
            GgufMetadataValue::U32(v) => writer.write_all(&v.to_le_bytes())?,
            GgufMetadataValue::I32(v) => writer.write_all(&v.to_le_bytes())?,
            GgufMetadataValue::U64(v) => writer.write_all(&v.to_le_bytes())?,
            GgufMetadataValue::I64(v) => writer.write_all(&v.to_le_bytes())?,
            GgufMetadataValue::F32(v) => writer.write_all(&v.to_le_bytes())?,
            GgufMetadataValue::F64(v) => writer.write_all(&v.to_le_bytes())?,
            GgufMetadataValue::Bool(v) => writer.write_all(&[u8::from(*v)])?,
            GgufMetadataValue::String(s) => write_string(writer, s)?,
            GgufMetadataValue::Array(values) => {
                // Empty arrays are written as U8 arrays; the element type is
                // irrelevant when there are no elements.
                let elem_type = values.first().map(|v| v.type_id()).unwrap_or(0);
                if values.iter().any(|v| v.type_id() != elem_type) {
                    return Err(ModelError::Other(
                        "GGUF arrays must be homogeneous".to_string(),
                    ));
                }
                writer.write_all(&elem_type.to_le_bytes())?;
                writer.write_all(&(values.len() as u64).to_le_bytes())?;
                for v in values {
                    v.write_payload(writer)?;
                }
            }
        }
        Ok(())
    }
}

fn type_mismatch(key: &str, expected: &str, got: &GgufMetadataValue) -> ModelError {
    ModelError::TypeMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
}

/// Collection of GGUF metadata key-value pairs.
#[derive(Debug, Clone, Default)]
pub struct GgufMetadata {
    pub entries: HashMap<String, GgufMetadataValue>,
}

impl GgufMetadata {
    /// Retrieve a string value by key.
    pub fn get_string(&self, key: &str) -> Result<&str> {
        match self.entries.get(key) {
            Some(GgufMetadataValue::String(s)) => Ok(s.as_str()),
            Some(other) => Err(type_mismatch(key, "String", other)),
            None => Err(ModelError::MissingKey(key.to_string())),
        }
    }

    /// Retrieve a u32 value by key.
    pub fn get_u32(&self, key: &str) -> Result<u32> {
        match self.entries.get(key) {
            Some(GgufMetadataValue::U32(v)) => Ok(*v),
            Some(other) => Err(type_mismatch(key, "U32", other)),
            None => Err(ModelError::MissingKey(key.to_string())),
        }
    }

    /// Retrieve a u32 value by key, falling back to `default` when absent.
    pub fn get_u32_or(&self, key: &str, default: u32) -> Result<u32> {
        if self.entries.contains_key(key) {
            self.get_u32(key)
        } else {
            Ok(default)
        }
    }

    /// Parse `n_kv` key-value metadata entries from a reader.
    ///
    /// Each entry is a GGUF string key, a u32 value type ID, then the payload.
    pub fn parse_kv(reader: &mut impl Read, n_kv: u64) -> Result<GgufMetadata> {
        let mut entries = HashMap::new();
        for _ in 0..n_kv {
            let key = read_string(reader)?;
            let type_id = read_u32(reader)?;
            let value = GgufMetadataValue::read(reader, type_id)?;
            entries.insert(key, value);
        }
        Ok(GgufMetadata { entries })
    }

    /// Write every entry in key order so the output is reproducible.
    pub fn write_kv(&self, writer: &mut impl Write) -> Result<()> {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();
        for key in keys {
            let value = &self.entries[key];
            write_string(writer, key)?;
            writer.write_all(&value.type_id().to_le_bytes())?;
            value.write_payload(writer)?;
        }
        Ok(())
    }
}
