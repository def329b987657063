//! Inference call sites
//!
//! Every call is timed and logged. Chat-style callers use
//! [`call_with_fallback`], which turns any failure into a fixed
//! user-visible string.

use docaudit_core::{ConversationMessage, InferenceClient, InferenceError, InferenceOptions};
use std::time::Instant;
use tracing::{error, info};

/// Returned when the endpoint misses its deadline
pub const TIMEOUT_FALLBACK: &str = "Argh!!! I took too long to respond. please try again";

/// Returned for every other inference failure
pub const FAILURE_FALLBACK: &str = "#@!# oops, something went wrong, please try again";

/// Complete `messages`, logging response size and elapsed time.
pub async fn complete_logged(
    client: &dyn InferenceClient,
    messages: &[ConversationMessage],
    options: &InferenceOptions,
) -> Result<String, InferenceError> {
    let start = Instant::now();
    let result = client.complete(messages, options).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match &result {
        Ok(response) => info!(
            provider = client.name(),
            response_chars = response.chars().count(),
            elapsed_ms,
            "Got inference response"
        ),
        Err(e) if e.is_timeout() => error!(provider = client.name(), elapsed_ms, "Timeout calling inference endpoint"),
        Err(e) => error!(provider = client.name(), elapsed_ms, error = %e, "Inference call failed"),
    }

    result
}

/// The fixed text substituted for a failed call
pub fn fallback_for(error: &InferenceError) -> &'static str {
    if error.is_timeout() {
        TIMEOUT_FALLBACK
    } else {
        FAILURE_FALLBACK
    }
}

/// Complete `messages`, never failing: errors become fallback text.
pub async fn call_with_fallback(
    client: &dyn InferenceClient,
    messages: &[ConversationMessage],
    options: &InferenceOptions,
) -> String {
    match complete_logged(client, messages, options).await {
        Ok(response) => response,
        Err(e) => fallback_for(&e).to_string(),
    }
}
