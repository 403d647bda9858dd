use std::collections::HashSet;
use std::sync::Arc;

use sw_model::{CharTokenizer, SwipeModel, Trajectory};

use crate::candidate::{Prediction, PredictionList};
use crate::decoder::{GeneratorConfig, SequenceDecoder};
use crate::error::{DecodeError, Result};

/// Owns one loaded model and the decoder configured for it.
///
/// A predictor is built once per worker and reused for every trajectory
/// in that worker's shard.
pub struct Predictor {
    model: Box<dyn SwipeModel>,
    decoder: Box<dyn SequenceDecoder>,
    tokenizer: Arc<CharTokenizer>,
    config: GeneratorConfig,
}

impl Predictor {
    pub fn new(
        model: Box<dyn SwipeModel>,
        config: &GeneratorConfig,
        tokenizer: Arc<CharTokenizer>,
    ) -> Result<Self> {
        if model.vocab_size() != tokenizer.len() {
            return Err(DecodeError::VocabMismatch {
                expected: tokenizer.len(),
                got: model.vocab_size(),
            });
        }
        let decoder = config.build(tokenizer.sos_id(), tokenizer.eos_id())?;
        tracing::debug!(model = model.name(), generator = decoder.name(), "predictor ready");
        Ok(Self {
            model,
            decoder,
            tokenizer,
            config: config.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Decode one trajectory into at most `width` predictions, best first.
    pub fn predict(&self, trajectory: &Trajectory) -> Result<PredictionList> {
        let candidates = self.decoder.decode(self.model.as_ref(), trajectory)?;
        let predictions: Vec<Prediction> = candidates
            .into_iter()
            .map(|c| Prediction {
                score: c.score,
                word: self.tokenizer.decode(&c.tokens),
            })
            .collect();

        let mut list = PredictionList::new(predictions).into_inner();
        if self.config.dedupe_words() {
            let mut seen = HashSet::new();
            list.retain(|p| seen.insert(p.word.clone()));
        }
        list.truncate(self.config.width());
        Ok(PredictionList::new(list))
    }
}
