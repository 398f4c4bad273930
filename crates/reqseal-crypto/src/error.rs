use thiserror::Error;

pub type SealResult<T> = Result<T, SealError>;

/// Failures of the envelope pipeline. Each variant names the stage that failed.
#[derive(Debug, Error)]
pub enum SealError {
    #[error("random source unavailable: {0}")]
    RandomSource(#[from] rand::Error),

    #[error("symmetric key must be {expected} bytes, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("cipher init failed: {0}")]
    CipherInit(String),

    #[error("padding error: {0}")]
    Padding(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}
