use async_trait::async_trait;
use docaudit_core::{ConversationMessage, InferenceClient, InferenceError, InferenceOptions};
use std::sync::Arc;
use std::time::Duration;

use crate::resilience::within_deadline;

/// Bounds every call of the wrapped client by a deadline.
///
/// The deadline is the shorter of the configured ceiling and the per-call
/// option, and an elapsed deadline surfaces as [`InferenceError::Timeout`].
pub struct TimeoutClient {
    inner: Arc<dyn InferenceClient>,
    ceiling: Duration,
}

impl TimeoutClient {
    pub fn new(inner: Arc<dyn InferenceClient>, ceiling: Duration) -> Self {
        Self { inner, ceiling }
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }
}

#[async_trait]
impl InferenceClient for TimeoutClient {
    async fn complete(
        &self,
        messages: &[ConversationMessage],
        options: &InferenceOptions,
    ) -> Result<String, InferenceError> {
        let deadline = self.ceiling.min(options.timeout);
        within_deadline(deadline, self.inner.name(), self.inner.complete(messages, options))
            .await
            .map_err(InferenceError::from)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sleepy(Duration);

    #[async_trait]
    impl InferenceClient for Sleepy {
        async fn complete(
            &self,
            _messages: &[ConversationMessage],
            _options: &InferenceOptions,
        ) -> Result<String, InferenceError> {
            tokio::time::sleep(self.0).await;
            Ok("done".to_string())
        }

        fn name(&self) -> &str {
            "sleepy"
        }
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let client = TimeoutClient::new(Arc::new(Sleepy(Duration::from_millis(1))), Duration::from_secs(5));
        let answer = client.prompt("hi", &InferenceOptions::default()).await.unwrap();
        assert_eq!(answer, "done");
        assert_eq!(client.name(), "sleepy");
    }

    #[tokio::test]
    async fn test_slow_call_times_out_at_ceiling() {
        let client = TimeoutClient::new(Arc::new(Sleepy(Duration::from_millis(200))), Duration::from_millis(20));
        let err = client.prompt("hi", &InferenceOptions::default()).await.unwrap_err();
        assert_eq!(err, InferenceError::Timeout(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_per_call_timeout_wins_when_shorter() {
        let client = TimeoutClient::new(Arc::new(Sleepy(Duration::from_millis(200))), Duration::from_secs(180));
        let options = InferenceOptions::default().with_timeout(Duration::from_millis(20));
        let err = client.prompt("hi", &options).await.unwrap_err();
        assert!(err.is_timeout());
    }
}
