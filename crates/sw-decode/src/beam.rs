use serde::{Deserialize, Serialize};
use sw_model::{EncodedContext, SwipeModel, Trajectory};

use crate::candidate::{ranked_tokens, Candidate};
use crate::decoder::{check_step_output, SequenceDecoder};
use crate::error::{DecodeError, Result};
use crate::greedy::DEFAULT_MAX_STEPS;

pub const DEFAULT_BEAM_WIDTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BeamParams {
    pub beam_width: usize,
    #[serde(rename = "max_steps_n")]
    pub max_steps: usize,
    /// Collapse candidates that decode to the same Word, keeping the best.
    pub dedupe_words: bool,
}

impl Default for BeamParams {
    fn default() -> Self {
        Self {
            beam_width: DEFAULT_BEAM_WIDTH,
            max_steps: DEFAULT_MAX_STEPS,
            dedupe_words: false,
        }
    }
}

/// Beam-internal partial sequence. Live hypotheses sit in the beam;
/// finished ones move to the completed set.
#[derive(Debug, Clone)]
struct Hypothesis {
    tokens: Vec<u32>,
    score: f32,
}

/// One parent x token extension considered during pruning.
struct Extension {
    score: f32,
    parent: usize,
    rank: usize,
    token: u32,
}

/// Beam search of width K.
///
/// Every live hypothesis proposes its K cheapest next tokens; the union is
/// pruned to the cheapest extensions, ties broken by parent order and then
/// token rank. A hypothesis that emits `<eos>` keeps its slot in the beam
/// budget, so each step keeps at most `K - completed` live extensions.
pub struct BeamSearchDecoder {
    sos_id: u32,
    eos_id: u32,
    width: usize,
    max_steps: usize,
}

impl BeamSearchDecoder {
    pub fn new(sos_id: u32, eos_id: u32, width: usize, max_steps: usize) -> Self {
        Self {
            sos_id,
            eos_id,
            width,
            max_steps,
        }
    }

    fn extend(
        &self,
        model: &dyn SwipeModel,
        context: &EncodedContext,
        live: &[Hypothesis],
        step: usize,
    ) -> Result<Vec<Extension>> {
        let mut extensions = Vec::with_capacity(live.len() * self.width);
        for (parent, hyp) in live.iter().enumerate() {
            let log_probs = model.step(context, &hyp.tokens)?;
            check_step_output(model, &log_probs)?;
            let ranked = ranked_tokens(&log_probs, self.width, step)?;
            for (rank, (token, added)) in ranked.into_iter().enumerate() {
                extensions.push(Extension {
                    score: hyp.score + added,
                    parent,
                    rank,
                    token,
                });
            }
        }
        extensions.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then(a.parent.cmp(&b.parent))
                .then(a.rank.cmp(&b.rank))
        });
        Ok(extensions)
    }
}

impl SequenceDecoder for BeamSearchDecoder {
    fn name(&self) -> &str {
        "beam"
    }

    fn decode(&self, model: &dyn SwipeModel, trajectory: &Trajectory) -> Result<Vec<Candidate>> {
        if !trajectory.has_valid_samples() {
            return Ok(vec![Candidate::new(vec![self.sos_id], 0.0)]);
        }

        let context = model.encode(trajectory)?;
        let mut live = vec![Hypothesis {
            tokens: vec![self.sos_id],
            score: 0.0,
        }];
        let mut completed: Vec<Hypothesis> = Vec::with_capacity(self.width);

        for step in 0..self.max_steps {
            let slots = self.width - completed.len();
            if slots == 0 || live.is_empty() {
                break;
            }

            let mut extensions = self.extend(model, &context, &live, step)?;
            extensions.truncate(slots);

            let mut next = Vec::with_capacity(extensions.len());
            for ext in extensions {
                if !ext.score.is_finite() {
                    return Err(DecodeError::NumericFault {
                        step,
                        detail: format!("hypothesis score became {}", ext.score),
                    });
                }
                let mut tokens = live[ext.parent].tokens.clone();
                tokens.push(ext.token);
                let hyp = Hypothesis {
                    tokens,
                    score: ext.score,
                };
                if ext.token == self.eos_id {
                    completed.push(hyp);
                } else {
                    next.push(hyp);
                }
            }
            tracing::trace!(step, live = next.len(), completed = completed.len(), "beam step");
            live = next;
        }

        // Anything still live at the cap is finalized without <eos>.
        let mut finished: Vec<Candidate> = completed
            .into_iter()
            .chain(live)
            .map(|h| Candidate::new(h.tokens, h.score))
            .collect();
        finished.sort_by(|a, b| a.score.total_cmp(&b.score));
        finished.truncate(self.width);
        Ok(finished)
    }
}
