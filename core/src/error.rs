use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LinkError {
    #[error("Invalid input size for {stage}: {len} is not a multiple of {group}")]
    InvalidInputSize {
        stage: &'static str,
        len: usize,
        group: usize,
    },

    #[error("Empty input: cannot derive a normalization scale")]
    EmptyInput,

    #[error("Non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LinkError>;
