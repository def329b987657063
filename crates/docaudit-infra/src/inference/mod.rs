//! HTTP inference clients
//!
//! Two wire protocols are supported: RunPod serverless `runsync` and
//! OpenAI-compatible chat completions. [`build_client`] picks one from
//! configuration and bounds it with the configured deadline.

pub mod openai;
pub mod runpod;
pub mod timeout;

pub use openai::OpenAiClient;
pub use runpod::RunpodClient;
pub use timeout::TimeoutClient;

use docaudit_core::{InferenceClient, InferenceConfig, InferenceError, InferenceProvider};
use reqwest::{header, Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::{InfraError, Result};

/// Build the configured inference client, wrapped in a [`TimeoutClient`]
pub fn build_client(config: &InferenceConfig) -> Result<Arc<dyn InferenceClient>> {
    let inner: Arc<dyn InferenceClient> = match config.provider {
        InferenceProvider::Runpod => Arc::new(RunpodClient::from_config(config)?),
        InferenceProvider::Openai => Arc::new(OpenAiClient::from_config(config)?),
    };

    info!(
        provider = inner.name(),
        base_url = %config.base_url,
        timeout_secs = config.timeout_secs,
        "Inference client ready"
    );
    Ok(Arc::new(TimeoutClient::new(inner, config.timeout())))
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    Client::builder()
        .timeout(timeout)
        .user_agent(format!("docaudit/{}", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()
        .map_err(InfraError::Http)
}

pub(crate) fn require(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InfraError::Configuration(format!("inference.{} must be set", name)));
    }
    Ok(())
}

/// Map a transport failure, keeping HTTP-layer deadlines as timeouts
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> InferenceError {
    if err.is_timeout() {
        InferenceError::Timeout(timeout)
    } else {
        InferenceError::Transport(err.to_string())
    }
}

pub(crate) async fn ensure_success(response: Response) -> std::result::Result<Response, InferenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(InferenceError::Transport(format!("HTTP {}: {}", status.as_u16(), body)))
}
