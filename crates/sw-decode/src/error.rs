use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("model error: {0}")]
    Model(#[from] sw_model::ModelError),
    #[error("numeric fault at step {step}: {detail}")]
    NumericFault { step: usize, detail: String },
    #[error("vocabulary size mismatch: expected {expected}, got {got}")]
    VocabMismatch { expected: usize, got: usize },
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
