pub mod beam;
pub mod candidate;
pub mod decoder;
pub mod error;
pub mod greedy;
pub mod predictor;

pub use beam::{BeamParams, BeamSearchDecoder};
pub use candidate::{Candidate, Prediction, PredictionList};
pub use decoder::{GeneratorConfig, SequenceDecoder};
pub use error::{DecodeError, Result};
pub use greedy::{GreedyDecoder, GreedyParams};
pub use predictor::Predictor;
