use std::io::{BufReader, Seek};
use std::path::Path;

use memmap2::Mmap;

use crate::error::{ModelError, Result};
use super::header::{GgufHeader, GGUF_DEFAULT_ALIGNMENT};
use super::io::align_to;
use super::metadata::GgufMetadata;
use super::tensor_info::{self, GgufTensorInfo};

/// A parsed GGUF file backed by a memory-mapped region.
///
/// Header, metadata and the tensor info table are read with buffered I/O;
/// tensor data is then served straight from the mapping.
pub struct GgufFile {
    pub header: GgufHeader,
    pub metadata: GgufMetadata,
    pub tensor_infos: Vec<GgufTensorInfo>,
    mmap: Mmap,
    /// Byte offset within the file where tensor data begins (aligned).
    data_offset: usize,
}

impl GgufFile {
    /// Open and parse a GGUF file from disk.
    pub fn open(path: &Path) -> Result<GgufFile> {
        let file = std::fs::File::open(path)?;
        let mut reader = BufReader::new(&file);

        let header = GgufHeader::parse(&mut reader)?;
        let metadata = GgufMetadata::parse_kv(&mut reader, header.n_kv)?;
        let tensor_infos = tensor_info::parse_tensor_infos(&mut reader, header.n_tensors)?;

        let alignment =
            metadata.get_u32_or("general.alignment", GGUF_DEFAULT_ALIGNMENT as u32)? as usize;
        if !alignment.is_power_of_two() {
            return Err(ModelError::Other(format!(
                "general.alignment must be a power of two, got {}",
                alignment
            )));
        }
        let data_offset = align_to(reader.stream_position()? as usize, alignment);

        // SAFETY: the mapping is read-only and weight files are not modified
        // while a run holds them open.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(GgufFile {
            header,
            metadata,
            tensor_infos,
            mmap,
            data_offset,
        })
    }

    pub fn tensor_info(&self, name: &str) -> Result<&GgufTensorInfo> {
        self.tensor_infos
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ModelError::TensorNotFound(name.to_string()))
    }

    /// Raw bytes of a tensor's data, bounds-checked against the mapping.
    ///
    /// An offset or size that overflows is reported as truncation.
    pub fn tensor_data(&self, info: &GgufTensorInfo) -> Result<&[u8]> {
        let start = usize::try_from(info.offset)
            .ok()
            .and_then(|offset| self.data_offset.checked_add(offset));
        let end = start
            .zip(info.data_size())
            .and_then(|(start, size)| start.checked_add(size));
        start
            .zip(end)
            .and_then(|(start, end)| self.mmap.get(start..end))
            .ok_or_else(|| ModelError::TruncatedTensor(info.name.clone()))
    }

    /// Load a tensor by name as f32, widening F16 data.
    pub fn tensor_f32(&self, name: &str) -> Result<Vec<f32>> {
        let info = self.tensor_info(name)?;
        let raw = self.tensor_data(info)?;
        Ok(info.dtype.decode(raw)?)
    }

    /// Load a tensor and check it has the given row-major shape.
    pub fn tensor_f32_shaped(&self, name: &str, shape: &[usize]) -> Result<Vec<f32>> {
        let info = self.tensor_info(name)?;
        let got = info.shape();
        if got != shape {
            return Err(ModelError::TensorShape {
                name: name.to_string(),
                expected: shape.to_vec(),
                got,
            });
        }
        self.tensor_f32(name)
    }
}
