use sw_tensor::DType;

use crate::error::Result;
use crate::gguf::reader::GgufFile;
use crate::gguf::writer::GgufWriter;
use super::config::{M1Config, KEY_ARCHITECTURE, KEY_HIDDEN_SIZE, KEY_N_FEATURES, KEY_VOCAB_SIZE};

/// All weight tensors of an m1-family model, row-major f32.
#[derive(Debug, Clone)]
pub struct M1Weights {
    /// Keyboard-key embedding, shape [vocab, hidden].
    pub key_embd: Vec<f32>,
    /// Per-sample feature projection, shape [hidden, n_features].
    pub coord_proj: Vec<f32>,
    /// Decoder token embedding, shape [vocab, hidden].
    pub tok_embd: Vec<f32>,
    /// Output projection over [token; attention context], shape [vocab, 2 * hidden].
    pub out: Vec<f32>,
    /// Output bias, shape [vocab].
    pub out_bias: Vec<f32>,
}

impl M1Weights {
    /// Tensor names:
    /// - `enc.key_embd`, `enc.coord_proj`
    /// - `dec.tok_embd`, `dec.out`, `dec.out_bias`
    pub fn from_gguf(gguf: &GgufFile, config: &M1Config) -> Result<M1Weights> {
        let (v, d, f) = (config.vocab_size, config.hidden_size, config.n_features);
        Ok(M1Weights {
            key_embd: gguf.tensor_f32_shaped("enc.key_embd", &[v, d])?,
            coord_proj: gguf.tensor_f32_shaped("enc.coord_proj", &[d, f])?,
            tok_embd: gguf.tensor_f32_shaped("dec.tok_embd", &[v, d])?,
            out: gguf.tensor_f32_shaped("dec.out", &[v, 2 * d])?,
            out_bias: gguf.tensor_f32_shaped("dec.out_bias", &[v])?,
        })
    }

    /// Export weights and config as a GGUF container.
    pub fn to_gguf(&self, config: &M1Config, dtype: DType) -> Result<GgufWriter> {
        let (v, d, f) = (config.vocab_size, config.hidden_size, config.n_features);
        let mut w = GgufWriter::new();
        w.set_string(KEY_ARCHITECTURE, &config.architecture)
            .set_u32(KEY_HIDDEN_SIZE, d as u32)
            .set_u32(KEY_VOCAB_SIZE, v as u32)
            .set_u32(KEY_N_FEATURES, f as u32);
        w.add_tensor("enc.key_embd", &[v, d], &self.key_embd, dtype)?;
        w.add_tensor("enc.coord_proj", &[d, f], &self.coord_proj, dtype)?;
        w.add_tensor("dec.tok_embd", &[v, d], &self.tok_embd, dtype)?;
        w.add_tensor("dec.out", &[v, 2 * d], &self.out, dtype)?;
        w.add_tensor("dec.out_bias", &[v], &self.out_bias, dtype)?;
        Ok(w)
    }
}
