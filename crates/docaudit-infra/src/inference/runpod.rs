//! RunPod serverless client

use async_trait::async_trait;
use docaudit_core::{
    ConversationMessage, InferenceClient, InferenceConfig, InferenceError, InferenceOptions,
};
use reqwest::{header, Client};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use super::{ensure_success, http_client, require, transport_error};
use crate::Result;

#[derive(Debug, Serialize)]
struct RunsyncRequest<'a> {
    input: RunsyncInput<'a>,
}

#[derive(Debug, Serialize)]
struct RunsyncInput<'a> {
    messages: &'a [ConversationMessage],
    max_tokens: u32,
    temperature: f32,
    repetition_penalty: f32,
    add_bos_token: bool,
    use_lora: bool,
}

#[derive(Debug, Deserialize)]
struct RunsyncResponse {
    #[serde(default)]
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Calls a RunPod serverless endpoint through `runsync`
#[derive(Clone)]
pub struct RunpodClient {
    http: Client,
    base_url: String,
    endpoint_id: String,
    api_key: Secret<String>,
    timeout: Duration,
}

impl std::fmt::Debug for RunpodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunpodClient")
            .field("base_url", &self.base_url)
            .field("endpoint_id", &self.endpoint_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl RunpodClient {
    pub fn new(
        base_url: impl Into<String>,
        endpoint_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoint_id: endpoint_id.into(),
            api_key: Secret::new(api_key.into()),
            timeout,
        })
    }

    pub fn from_config(config: &InferenceConfig) -> Result<Self> {
        require(&config.endpoint_id, "endpoint_id")?;
        require(&config.api_key, "api_key")?;
        Self::new(
            config.base_url.as_str(),
            config.endpoint_id.as_str(),
            config.api_key.as_str(),
            config.timeout(),
        )
    }

    fn url(&self) -> String {
        format!("{}/v2/{}/runsync", self.base_url, self.endpoint_id)
    }

    /// Concatenate the job output, which is either one string or a list of
    /// streamed fragments
    fn output_text(output: Option<Value>) -> std::result::Result<String, InferenceError> {
        match output {
            Some(Value::String(text)) => Ok(text),
            Some(Value::Array(fragments)) => fragments
                .into_iter()
                .map(|fragment| match fragment {
                    Value::String(text) => Ok(text),
                    other => Err(InferenceError::InvalidResponse(format!(
                        "unexpected output fragment: {}",
                        other
                    ))),
                })
                .collect(),
            Some(other) => Err(InferenceError::InvalidResponse(format!(
                "unexpected output: {}",
                other
            ))),
            None => Err(InferenceError::InvalidResponse("job completed without output".into())),
        }
    }
}

#[async_trait]
impl InferenceClient for RunpodClient {
    #[instrument(skip(self, messages, options), fields(endpoint = %self.endpoint_id))]
    async fn complete(
        &self,
        messages: &[ConversationMessage],
        options: &InferenceOptions,
    ) -> std::result::Result<String, InferenceError> {
        let body = RunsyncRequest {
            input: RunsyncInput {
                messages,
                max_tokens: options.max_tokens,
                temperature: options.temperature,
                repetition_penalty: 1.0,
                add_bos_token: false,
                use_lora: false,
            },
        };

        let started = Instant::now();
        let response = self
            .http
            .post(self.url())
            .query(&[("wait", options.timeout.as_millis() as u64)])
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let job: RunsyncResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        debug!(
            job_id = %job.id,
            status = %job.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "RunPod job finished"
        );

        match job.status.as_str() {
            "COMPLETED" => Self::output_text(job.output),
            // runsync returned before the job finished
            "IN_QUEUE" | "IN_PROGRESS" => Err(InferenceError::Timeout(options.timeout)),
            status => Err(InferenceError::Transport(format!(
                "RunPod job {} {}: {}",
                job.id,
                status,
                job.error.unwrap_or_default()
            ))),
        }
    }

    fn name(&self) -> &str {
        "runpod"
    }
}
