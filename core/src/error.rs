use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemodError {
    #[error("Downsampling factor must be greater than 1")]
    InvalidFactor,

    #[error("Insufficient data")]
    InsufficientData,

    #[error("Invalid input size")]
    InvalidInputSize,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DemodError>;
