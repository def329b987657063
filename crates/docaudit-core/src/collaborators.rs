//! Interfaces of the external services the pipeline talks to.
//!
//! Implementations live outside this crate (HTTP clients in `docaudit-infra`,
//! in-memory fakes in tests) and are shared as `Arc<dyn ...>`.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{BlobStoreError, InferenceError, MailError};
use crate::types::ConversationMessage;

/// Sampling and deadline settings for one inference call
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl InferenceOptions {
    pub fn new() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.001,
            timeout: Duration::from_secs(180),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Remote language-model endpoint
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Complete a conversation and return the assistant text.
    async fn complete(
        &self,
        messages: &[ConversationMessage],
        options: &InferenceOptions,
    ) -> Result<String, InferenceError>;

    /// Complete a single prompt, sent as a one-message user conversation.
    async fn prompt(&self, prompt: &str, options: &InferenceOptions) -> Result<String, InferenceError> {
        let messages = [ConversationMessage::user(prompt)];
        self.complete(&messages, options).await
    }

    /// Provider name used in logs
    fn name(&self) -> &str;
}

/// Object storage holding user uploads
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List every key under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobStoreError>;

    /// Download the object stored at `key`.
    async fn download(&self, key: &str) -> Result<Vec<u8>, BlobStoreError>;

    /// Produce a URL the client can `PUT` the object to directly.
    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, BlobStoreError>;
}

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: String,
}

/// Outbound mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;
    use std::sync::Mutex;

    struct EchoClient {
        seen: Mutex<Vec<ConversationMessage>>,
    }

    #[async_trait]
    impl InferenceClient for EchoClient {
        async fn complete(
            &self,
            messages: &[ConversationMessage],
            _options: &InferenceOptions,
        ) -> Result<String, InferenceError> {
            self.seen.lock().unwrap().extend_from_slice(messages);
            Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_default_options() {
        let options = InferenceOptions::default();
        assert_eq!(options.max_tokens, 4096);
        assert_eq!(options.temperature, 0.001);
        assert_eq!(options.timeout, Duration::from_secs(180));
    }

    #[tokio::test]
    async fn test_prompt_sends_single_user_message() {
        let client = EchoClient { seen: Mutex::new(Vec::new()) };
        let answer = client.prompt("summarize this", &InferenceOptions::default()).await.unwrap();

        assert_eq!(answer, "summarize this");
        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].role, MessageRole::User);
    }
}
