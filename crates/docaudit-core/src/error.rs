use std::time::Duration;
use thiserror::Error;

/// Errors raised by an inference collaborator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InferenceError {
    /// The endpoint did not answer within the deadline
    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),

    /// Network or provider failure
    #[error("Inference transport error: {0}")]
    Transport(String),

    /// The endpoint answered with something we could not interpret
    #[error("Invalid inference response: {0}")]
    InvalidResponse(String),
}

impl InferenceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Timeout(_))
    }
}

/// Errors raised by a blob store collaborator
#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob store error: {0}")]
    Backend(String),
}

/// Errors raised by a mail collaborator
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Mail rejected: {0}")]
    Rejected(String),
}

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
