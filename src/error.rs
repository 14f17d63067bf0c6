//! Error types shared by the model, the forward evaluator and the Viterbi decoder.

use thiserror::Error;

/// Errors produced while building a model or evaluating an observation sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The model's dimensions or probability tables are malformed.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The observation sequence is empty or contains an out-of-range symbol.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A probability is finite in log-space but underflows to 0.0 when
    /// exponentiated.
    #[error("probability underflows to zero (log probability = {log_probability})")]
    NumericDegenerate { log_probability: f64 },
}

impl Error {
    pub fn invalid_model<S: Into<String>>(msg: S) -> Self {
        Error::InvalidModel(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }
}

/// Result type for HMM operations.
pub type Result<T> = std::result::Result<T, Error>;
