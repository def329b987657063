pub mod blob;
pub mod inference;
pub mod resilience;

pub use blob::FsBlobStore;
pub use inference::{build_client, OpenAiClient, RunpodClient, TimeoutClient};
pub use resilience::{within_deadline, Bounded, DeadlineExceeded};

#[derive(Debug, thiserror::Error)]
pub enum InfraError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InfraError>;
