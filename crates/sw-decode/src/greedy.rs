use serde::{Deserialize, Serialize};
use sw_model::{SwipeModel, Trajectory};

use crate::candidate::{ranked_tokens, Candidate};
use crate::decoder::{check_step_output, SequenceDecoder};
use crate::error::{DecodeError, Result};

pub const DEFAULT_MAX_STEPS: usize = 35;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GreedyParams {
    #[serde(rename = "max_steps_n")]
    pub max_steps: usize,
}

impl Default for GreedyParams {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Greedy decoder: appends the most probable token until `<eos>` or the
/// step cap. Always yields exactly one candidate.
pub struct GreedyDecoder {
    sos_id: u32,
    eos_id: u32,
    max_steps: usize,
}

impl GreedyDecoder {
    pub fn new(sos_id: u32, eos_id: u32, max_steps: usize) -> Self {
        Self {
            sos_id,
            eos_id,
            max_steps,
        }
    }
}

impl SequenceDecoder for GreedyDecoder {
    fn name(&self) -> &str {
        "greedy"
    }

    fn decode(&self, model: &dyn SwipeModel, trajectory: &Trajectory) -> Result<Vec<Candidate>> {
        let mut tokens = vec![self.sos_id];
        if !trajectory.has_valid_samples() {
            return Ok(vec![Candidate::new(tokens, 0.0)]);
        }

        let context = model.encode(trajectory)?;
        let mut score = 0.0f32;

        for step in 0..self.max_steps {
            let log_probs = model.step(&context, &tokens)?;
            check_step_output(model, &log_probs)?;

            let (token, added) = ranked_tokens(&log_probs, 1, step)?
                .first()
                .copied()
                .ok_or(DecodeError::VocabMismatch {
                    expected: model.vocab_size(),
                    got: 0,
                })?;
            score += added;
            tokens.push(token);
            if token == self.eos_id {
                break;
            }
        }
        Ok(vec![Candidate::new(tokens, score)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sw_model::{EncodedContext, ModelError, TouchSample};

    /// <sos>=0, <eos>=1, then letters; <eos> wins once the prefix reaches `eos_at`.
    struct Countdown {
        eos_at: usize,
    }

    impl SwipeModel for Countdown {
        fn name(&self) -> &str {
            "countdown"
        }
        fn encode(&self, _: &Trajectory) -> std::result::Result<EncodedContext, ModelError> {
            EncodedContext::new(vec![0.0], 1)
        }
        fn step(
            &self,
            _: &EncodedContext,
            tokens: &[u32],
        ) -> std::result::Result<Vec<f32>, ModelError> {
            let probs: [f32; 4] = if tokens.len() >= self.eos_at {
                [0.0, 0.7, 0.15, 0.15]
            } else {
                [0.0, 0.2, 0.4, 0.4]
            };
            Ok(probs.iter().map(|p| p.ln()).collect())
        }
        fn vocab_size(&self) -> usize {
            4
        }
    }

    fn swipe() -> Trajectory {
        Trajectory::from_samples(&[TouchSample::at(2, 0.5, 0.5)])
    }

    #[test]
    fn test_ties_pick_lowest_token_id() {
        let out = GreedyDecoder::new(0, 1, 10)
            .decode(&Countdown { eos_at: 3 }, &swipe())
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tokens, vec![0, 2, 2, 1]);
        let expected = -2.0 * 0.4f32.ln() - 0.7f32.ln();
        assert_relative_eq!(out[0].score, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_step_cap_stops_without_eos() {
        let out = GreedyDecoder::new(0, 1, 2)
            .decode(&Countdown { eos_at: 100 }, &swipe())
            .unwrap();
        assert_eq!(out[0].tokens, vec![0, 2, 2]);
    }

    #[test]
    fn test_params_use_config_key_names() {
        let p: GreedyParams = serde_json::from_str(r#"{"max_steps_n": 7}"#).unwrap();
        assert_eq!(p.max_steps, 7);
        assert_eq!(serde_json::from_str::<GreedyParams>("{}").unwrap(), GreedyParams::default());
        assert!(serde_json::from_str::<GreedyParams>(r#"{"beam_width": 2}"#).is_err());
    }
}
