use crate::error::{ModelError, Result};
use crate::trajectory::Trajectory;

/// Encoder output for one trajectory, batch-major `[positions, hidden_size]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedContext {
    hidden: Vec<f32>,
    hidden_size: usize,
}

impl EncodedContext {
    pub fn new(hidden: Vec<f32>, hidden_size: usize) -> Result<Self> {
        if hidden_size == 0 || hidden.len() % hidden_size != 0 {
            return Err(ModelError::Other(format!(
                "encoded context of {} values is not a multiple of hidden size {}",
                hidden.len(),
                hidden_size
            )));
        }
        Ok(Self { hidden, hidden_size })
    }

    pub fn positions(&self) -> usize {
        self.hidden.len() / self.hidden_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn row(&self, position: usize) -> &[f32] {
        &self.hidden[position * self.hidden_size..(position + 1) * self.hidden_size]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.hidden
    }
}

/// An encoder-decoder model that scores the next token of a word given a
/// swipe trajectory.
///
/// Instances are owned by exactly one worker; they are `Send` but never
/// shared between threads.
pub trait SwipeModel: Send {
    /// Registered architecture name (e.g. "m1").
    fn name(&self) -> &str;

    /// Encode a trajectory once; padding samples must be ignored.
    fn encode(&self, trajectory: &Trajectory) -> Result<EncodedContext>;

    /// Log-probabilities over the vocabulary for the token following
    /// `tokens` (which starts with `<sos>`).
    fn step(&self, context: &EncodedContext, tokens: &[u32]) -> Result<Vec<f32>>;

    /// Returns the vocabulary size (length of every `step` output).
    fn vocab_size(&self) -> usize;
}
