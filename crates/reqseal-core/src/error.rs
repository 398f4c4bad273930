use thiserror::Error;

pub type ReqsealResult<T> = Result<T, ReqsealError>;

#[derive(Debug, Error)]
pub enum ReqsealError {
    #[error("config error: {0}")]
    Config(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
