use std::fmt;

use half::f16;

use crate::error::{Result, TensorError};

/// Storage type of a weights tensor. Computation always happens in f32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    /// IEEE 754 half precision, widened to f32 on load.
    F16,
}

impl DType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 => 2,
        }
    }

    /// Maps a GGUF tensor type id. Quantized ids are not weights we load.
    pub fn from_gguf_type(id: u32) -> Option<DType> {
        match id {
            0 => Some(DType::F32),
            1 => Some(DType::F16),
            _ => None,
        }
    }

    pub fn to_gguf_type(&self) -> u32 {
        match self {
            DType::F32 => 0,
            DType::F16 => 1,
        }
    }

    /// Little-endian stored bytes to f32 values.
    pub fn decode(&self, raw: &[u8]) -> Result<Vec<f32>> {
        let width = self.size_in_bytes();
        if raw.len() % width != 0 {
            return Err(TensorError::LengthMismatch {
                expected: raw.len() / width * width + width,
                got: raw.len(),
            });
        }
        Ok(match self {
            DType::F32 => raw
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
            DType::F16 => raw
                .chunks_exact(2)
                .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
                .collect(),
        })
    }

    /// f32 values to little-endian stored bytes, rounding for F16.
    pub fn encode(&self, data: &[f32]) -> Vec<u8> {
        match self {
            DType::F32 => data.iter().flat_map(|v| v.to_le_bytes()).collect(),
            DType::F16 => data.iter().flat_map(|v| f16::from_f32(*v).to_le_bytes()).collect(),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DType::F32 => "f32",
            DType::F16 => "f16",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantized_ids_rejected() {
        assert!(DType::from_gguf_type(2).is_none());
        assert!(DType::from_gguf_type(8).is_none());
        assert_eq!(DType::from_gguf_type(1), Some(DType::F16));
    }

    #[test]
    fn test_f16_storage_is_lossy_but_close() {
        let values = [0.1f32, -2.5, 1000.0];
        let bytes = DType::F16.encode(&values);
        assert_eq!(bytes.len(), 6);
        let back = DType::F16.decode(&bytes).unwrap();
        assert_eq!(back[1], -2.5);
        assert!((back[0] - 0.1).abs() < 1e-3);
        assert_eq!(back[2], 1000.0);
    }

    #[test]
    fn test_decode_rejects_partial_elements() {
        assert!(DType::F32.decode(&[0u8; 6]).is_err());
        assert_eq!(DType::F32.decode(&[0u8; 8]).unwrap(), vec![0.0, 0.0]);
    }
}
