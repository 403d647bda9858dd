use thiserror::Error;

use sw_decode::DecodeError;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("configuration error: {0}")]
    Config(String),
    /// A curve that cannot be featurized; fails only its own record.
    #[error("invalid curve: {0}")]
    InvalidCurve(String),
    #[error("failed to load model for {binding}: {source}")]
    ModelLoad { binding: String, source: DecodeError },
    #[error("dispatch failed: {reason}; {} item(s) unaccounted", .missing.len())]
    Dispatch { missing: Vec<usize>, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model error: {0}")]
    Model(#[from] sw_model::ModelError),
}

pub type Result<T> = std::result::Result<T, PredictError>;
