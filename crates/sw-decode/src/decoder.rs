use serde::{Deserialize, Serialize};
use sw_model::{SwipeModel, Trajectory};

use crate::beam::{BeamParams, BeamSearchDecoder};
use crate::candidate::Candidate;
use crate::error::{DecodeError, Result};
use crate::greedy::{GreedyDecoder, GreedyParams};

/// Trait for strategies that turn one trajectory into ranked candidates.
pub trait SequenceDecoder: Send + Sync {
    /// Returns the name of this strategy.
    fn name(&self) -> &str;

    /// Decode one trajectory. Candidates come back ascending by score.
    fn decode(&self, model: &dyn SwipeModel, trajectory: &Trajectory) -> Result<Vec<Candidate>>;
}

/// Generator selection, closed over the supported strategies.
///
/// Serialized as `{"generator": "beam", "generator_kwargs": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "generator", content = "generator_kwargs", rename_all = "snake_case")]
pub enum GeneratorConfig {
    Greedy(GreedyParams),
    Beam(BeamParams),
}

impl GeneratorConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorConfig::Greedy(_) => "greedy",
            GeneratorConfig::Beam(_) => "beam",
        }
    }

    /// Maximum number of candidates a prediction list may hold.
    pub fn width(&self) -> usize {
        match self {
            GeneratorConfig::Greedy(_) => 1,
            GeneratorConfig::Beam(p) => p.beam_width,
        }
    }

    /// Whether candidates with an identical Word collapse to the best one.
    pub fn dedupe_words(&self) -> bool {
        match self {
            GeneratorConfig::Greedy(_) => false,
            GeneratorConfig::Beam(p) => p.dedupe_words,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let (max_steps, width) = match self {
            GeneratorConfig::Greedy(p) => (p.max_steps, 1),
            GeneratorConfig::Beam(p) => (p.max_steps, p.beam_width),
        };
        if max_steps == 0 {
            return Err(DecodeError::InvalidConfig("max_steps_n must be at least 1".to_string()));
        }
        if width == 0 {
            return Err(DecodeError::InvalidConfig("beam_width must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Build the decoder for a vocabulary's `<sos>`/`<eos>` ids.
    pub fn build(&self, sos_id: u32, eos_id: u32) -> Result<Box<dyn SequenceDecoder>> {
        self.validate()?;
        Ok(match self {
            GeneratorConfig::Greedy(p) => {
                Box::new(GreedyDecoder::new(sos_id, eos_id, p.max_steps))
            }
            GeneratorConfig::Beam(p) => Box::new(BeamSearchDecoder::new(
                sos_id,
                eos_id,
                p.beam_width,
                p.max_steps,
            )),
        })
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig::Greedy(GreedyParams::default())
    }
}

/// Check a step output against the model's vocabulary size.
pub(crate) fn check_step_output(model: &dyn SwipeModel, log_probs: &[f32]) -> Result<()> {
    if log_probs.len() != model.vocab_size() {
        return Err(DecodeError::VocabMismatch {
            expected: model.vocab_size(),
            got: log_probs.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_tagged_form() {
        let json = r#"{"generator": "beam", "generator_kwargs": {"beam_width": 4}}"#;
        let cfg: GeneratorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.width(), 4);
        assert_eq!(cfg.kind(), "beam");
        match cfg {
            GeneratorConfig::Beam(p) => assert_eq!(p.max_steps, 35),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_generator_or_kwarg_rejected() {
        let bad_kind = r#"{"generator": "sampling", "generator_kwargs": {}}"#;
        assert!(serde_json::from_str::<GeneratorConfig>(bad_kind).is_err());
        let bad_kwarg = r#"{"generator": "greedy", "generator_kwargs": {"beam_width": 3}}"#;
        assert!(serde_json::from_str::<GeneratorConfig>(bad_kwarg).is_err());
    }

    #[test]
    fn test_zero_width_is_invalid() {
        let cfg = GeneratorConfig::Beam(BeamParams {
            beam_width: 0,
            ..BeamParams::default()
        });
        assert!(matches!(cfg.build(0, 1), Err(DecodeError::InvalidConfig(_))));
    }
}
