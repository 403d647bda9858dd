//! The m1 family: a single-layer attention encoder-decoder over swipe
//! trajectories. Variants differ only in hidden size.

pub mod config;
pub mod weights;

pub use config::M1Config;
pub use weights::M1Weights;

use sw_tensor::{ComputeBackend, CpuBackend};

use crate::architecture::{EncodedContext, SwipeModel};
use crate::error::{ModelError, Result};
use crate::gguf::reader::GgufFile;
use crate::trajectory::Trajectory;

pub struct M1Model {
    pub config: M1Config,
    pub weights: M1Weights,
    backend: CpuBackend,
}

impl M1Model {
    pub fn from_gguf(gguf: &GgufFile) -> Result<M1Model> {
        let config = M1Config::from_gguf(&gguf.metadata)?;
        let weights = M1Weights::from_gguf(gguf, &config)?;
        M1Model::from_parts(config, weights)
    }

    /// Assemble a model from in-memory weights, checking every tensor length.
    pub fn from_parts(config: M1Config, weights: M1Weights) -> Result<M1Model> {
        let (v, d, f) = (config.vocab_size, config.hidden_size, config.n_features);
        if v == 0 || d == 0 {
            return Err(ModelError::Other(format!(
                "degenerate m1 config: vocab_size={} hidden_size={}",
                v, d
            )));
        }
        let expected = [
            ("enc.key_embd", weights.key_embd.len(), v * d),
            ("enc.coord_proj", weights.coord_proj.len(), d * f),
            ("dec.tok_embd", weights.tok_embd.len(), v * d),
            ("dec.out", weights.out.len(), v * 2 * d),
            ("dec.out_bias", weights.out_bias.len(), v),
        ];
        for (name, got, want) in expected {
            if got != want {
                return Err(ModelError::TensorShape {
                    name: name.to_string(),
                    expected: vec![want],
                    got: vec![got],
                });
            }
        }
        Ok(M1Model {
            config,
            weights,
            backend: CpuBackend::new(),
        })
    }

    fn embedding<'a>(&self, table: &'a [f32], token: u32, what: &str) -> Result<&'a [f32]> {
        let d = self.config.hidden_size;
        let t = token as usize;
        if t >= self.config.vocab_size {
            return Err(ModelError::InvalidTrajectory(format!(
                "{} token id {} exceeds vocab size {}",
                what, token, self.config.vocab_size
            )));
        }
        Ok(&table[t * d..(t + 1) * d])
    }
}

impl SwipeModel for M1Model {
    fn name(&self) -> &str {
        &self.config.architecture
    }

    /// `h_i = key_embd[key_i] + coord_proj @ features_i` for every real sample.
    fn encode(&self, trajectory: &Trajectory) -> Result<EncodedContext> {
        let d = self.config.hidden_size;
        let f = self.config.n_features;
        let mut hidden = Vec::with_capacity(trajectory.n_valid() * d);

        for (key, features) in trajectory.valid_samples() {
            if features.len() != f {
                return Err(ModelError::InvalidTrajectory(format!(
                    "sample has {} features, model expects {}",
                    features.len(),
                    f
                )));
            }
            let key_vec = self.embedding(&self.weights.key_embd, key, "key")?;
            let proj = self.backend.matmul(&self.weights.coord_proj, features, d, f, 1)?;
            hidden.extend(self.backend.add(key_vec, &proj)?);
        }

        EncodedContext::new(hidden, d)
    }

    /// Dot-product attention of the last token's embedding over the encoded
    /// positions, then a linear layer over `[query; context]`.
    fn step(&self, context: &EncodedContext, tokens: &[u32]) -> Result<Vec<f32>> {
        let d = self.config.hidden_size;
        let v = self.config.vocab_size;
        if context.hidden_size() != d {
            return Err(ModelError::Other(format!(
                "context hidden size {} does not match model hidden size {}",
                context.hidden_size(),
                d
            )));
        }
        let last = *tokens
            .last()
            .ok_or_else(|| ModelError::Other("no tokens to decode from".to_string()))?;
        let query = self.embedding(&self.weights.tok_embd, last, "decoder")?;

        let positions = context.positions();
        let mut attended = vec![0.0f32; d];
        if positions > 0 {
            let scale = 1.0 / (d as f32).sqrt();
            let mut scores = Vec::with_capacity(positions);
            for p in 0..positions {
                scores.push(self.backend.dot(query, context.row(p))? * scale);
            }
            let attn = self.backend.softmax(&scores, positions)?;
            // attended = attn @ hidden, [1, positions] x [positions, d]
            attended = self.backend.matmul(&attn, context.as_slice(), 1, positions, d)?;
        }

        let mut input = Vec::with_capacity(2 * d);
        input.extend_from_slice(query);
        input.extend_from_slice(&attended);

        let logits = self.backend.matmul(&self.weights.out, &input, v, 2 * d, 1)?;
        let logits = self.backend.add(&logits, &self.weights.out_bias)?;
        Ok(self.backend.log_softmax(&logits, v)?)
    }

    fn vocab_size(&self) -> usize {
        self.config.vocab_size
    }
}
