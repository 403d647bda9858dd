use std::io::{Read, Write};

use sw_tensor::DType;

use crate::error::{ModelError, Result};
use super::io::{read_string, read_u32, read_u64, write_string};

/// Describes a single tensor stored within a GGUF file.
#[derive(Debug, Clone, PartialEq)]
pub struct GgufTensorInfo {
    /// Tensor name (e.g. "enc.key_embd").
    pub name: String,
    /// Dimension sizes in GGUF order: `dims[0]` is the fastest-varying one.
    pub dims: Vec<u64>,
    pub dtype: DType,
    /// Byte offset of this tensor's data from the start of the data section.
    pub offset: u64,
}

impl GgufTensorInfo {
    /// Element count, or `None` if the recorded dims overflow `usize`.
    pub fn numel(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| usize::try_from(d).ok().and_then(|d| acc.checked_mul(d)))
    }

    pub fn data_size(&self) -> Option<usize> {
        self.numel()?.checked_mul(self.dtype.size_in_bytes())
    }

    /// Row-major shape, outermost dimension first.
    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().rev().map(|&d| d as usize).collect()
    }

    pub(crate) fn write(&self, writer: &mut impl Write) -> Result<()> {
        write_string(writer, &self.name)?;
        writer.write_all(&(self.dims.len() as u32).to_le_bytes())?;
        for d in &self.dims {
            writer.write_all(&d.to_le_bytes())?;
        }
        writer.write_all(&self.dtype.to_gguf_type().to_le_bytes())?;
        writer.write_all(&self.offset.to_le_bytes())?;
        Ok(())
    }
}

/// Parse `n_tensors` tensor info entries from a reader.
///
/// Each entry: name, u32 dimension count, u64 per dimension, u32 GGUF type
/// ID, u64 byte offset within the data section.
pub fn parse_tensor_infos(reader: &mut impl Read, n_tensors: u64) -> Result<Vec<GgufTensorInfo>> {
    let mut infos = Vec::with_capacity(n_tensors.min(1024) as usize);
    for _ in 0..n_tensors {
        let name = read_string(reader)?;

        let n_dims = read_u32(reader)?;
        if n_dims > 4 {
            return Err(ModelError::Other(format!(
                "tensor '{}' has {} dimensions",
                name, n_dims
            )));
        }
        let mut dims = Vec::with_capacity(n_dims as usize);
        for _ in 0..n_dims {
            dims.push(read_u64(reader)?);
        }

        let type_id = read_u32(reader)?;
        let dtype = DType::from_gguf_type(type_id).ok_or(ModelError::UnsupportedGgufType(type_id))?;

        let offset = read_u64(reader)?;

        infos.push(GgufTensorInfo {
            name,
            dims,
            dtype,
            offset,
        });
    }
    Ok(infos)
}
