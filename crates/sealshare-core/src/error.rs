use thiserror::Error;

pub type SealshareResult<T> = Result<T, SealshareError>;

#[derive(Debug, Error)]
pub enum SealshareError {
    /// Empty or otherwise unusable username / filename.
    #[error("invalid input: {0}")]
    Input(String),

    /// Login failure. Carries no detail about the cause.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// MAC or signature verification failed.
    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// A verified record did not have the expected structure.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
