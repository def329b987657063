//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use docaudit_core::{
    ConversationMessage, InferenceClient, InferenceConfig, InferenceError, InferenceOptions,
};
use reqwest::{header, Client};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use super::{ensure_success, http_client, require, transport_error};
use crate::Result;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Secret<String>,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: Secret::new(api_key.into()),
            timeout,
        })
    }

    pub fn from_config(config: &InferenceConfig) -> Result<Self> {
        require(&config.api_key, "api_key")?;
        Self::new(
            config.base_url.as_str(),
            config.model.as_str(),
            config.api_key.as_str(),
            config.timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    #[instrument(skip(self, messages, options), fields(model = %self.model))]
    async fn complete(
        &self,
        messages: &[ConversationMessage],
        options: &InferenceOptions,
    ) -> std::result::Result<String, InferenceError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let completion: ChatCompletionResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        debug!(choices = completion.choices.len(), "Chat completion received");

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| InferenceError::InvalidResponse("no message content in first choice".into()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(server.uri(), "gpt-4o-mini", "sk-test", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header_eq("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "assistant", "content": "How can I help you?"},
                    {"role": "user", "content": "Audit this"}
                ],
                "max_tokens": 4096
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "Done."}},
                    {"index": 1, "message": {"role": "assistant", "content": "Ignored."}}
                ]
            })))
            .mount(&server)
            .await;

        let messages = vec![
            ConversationMessage::assistant("How can I help you?"),
            ConversationMessage::user("Audit this"),
        ];
        let answer = client(&server)
            .complete(&messages, &InferenceOptions::default())
            .await
            .unwrap();
        assert_eq!(answer, "Done.");
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client(&server)
            .prompt("q", &InferenceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client(&server)
            .prompt("q", &InferenceOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, InferenceError::Transport("HTTP 503: overloaded".into()));
    }

    #[tokio::test]
    async fn test_http_deadline_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let slow = OpenAiClient::new(server.uri(), "gpt-4o", "sk-test", Duration::from_millis(50)).unwrap();
        let err = slow
            .prompt("q", &InferenceOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, InferenceError::Timeout(Duration::from_millis(50)));
    }
}
