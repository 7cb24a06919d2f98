use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("slot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("remote backend returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("backend error: {0}")]
    Backend(String),
}
