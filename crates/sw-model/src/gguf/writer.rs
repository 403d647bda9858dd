use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use sw_tensor::DType;

use crate::error::{ModelError, Result};
use super::header::{GgufHeader, GGUF_DEFAULT_ALIGNMENT, GGUF_VERSION};
use super::io::align_to;
use super::metadata::{GgufMetadata, GgufMetadataValue};
use super::tensor_info::GgufTensorInfo;

/// Builds a GGUF v3 container in memory and writes it out in one pass.
///
/// Used to export swipe model weights and to produce fixtures.
#[derive(Default)]
pub struct GgufWriter {
    metadata: GgufMetadata,
    tensors: Vec<(GgufTensorInfo, Vec<u8>)>,
    data_len: usize,
}

impl GgufWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: GgufMetadataValue) -> &mut Self {
        self.metadata.entries.insert(key.to_string(), value);
        self
    }

    pub fn set_u32(&mut self, key: &str, value: u32) -> &mut Self {
        self.set(key, GgufMetadataValue::U32(value))
    }

    pub fn set_string(&mut self, key: &str, value: &str) -> &mut Self {
        self.set(key, GgufMetadataValue::String(value.to_string()))
    }

    /// Add a tensor with a row-major `shape`, stored as `dtype`.
    pub fn add_tensor(
        &mut self,
        name: &str,
        shape: &[usize],
        data: &[f32],
        dtype: DType,
    ) -> Result<&mut Self> {
        let numel: usize = shape.iter().product();
        if numel != data.len() {
            return Err(ModelError::TensorShape {
                name: name.to_string(),
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        if self.tensors.iter().any(|(info, _)| info.name == name) {
            return Err(ModelError::Other(format!("duplicate tensor '{}'", name)));
        }

        let bytes = dtype.encode(data);

        let offset = align_to(self.data_len, GGUF_DEFAULT_ALIGNMENT);
        self.data_len = offset + bytes.len();
        let info = GgufTensorInfo {
            name: name.to_string(),
            dims: shape.iter().rev().map(|&d| d as u64).collect(),
            dtype,
            offset: offset as u64,
        };
        self.tensors.push((info, bytes));
        Ok(self)
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
        let mut head = Vec::new();
        GgufHeader {
            version: GGUF_VERSION,
            n_tensors: self.tensors.len() as u64,
            n_kv: self.metadata.entries.len() as u64,
        }
        .write(&mut head)?;
        self.metadata.write_kv(&mut head)?;
        for (info, _) in &self.tensors {
            info.write(&mut head)?;
        }

        let data_start = align_to(head.len(), GGUF_DEFAULT_ALIGNMENT);
        head.resize(data_start, 0);
        writer.write_all(&head)?;

        let mut written = 0usize;
        for (info, bytes) in &self.tensors {
            let pad = info.offset as usize - written;
            writer.write_all(&vec![0u8; pad])?;
            writer.write_all(bytes)?;
            written = info.offset as usize + bytes.len();
        }
        Ok(())
    }

    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }
}
