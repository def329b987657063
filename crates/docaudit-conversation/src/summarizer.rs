//! Chunked summarization
//!
//! Long text is split into overlapping token windows, each window is sent
//! through the summarization prompt, and the partial summaries are joined
//! in order.

use docaudit_core::{ConversationMessage, InferenceClient, InferenceOptions, SummarizerConfig};
use docaudit_ingestion::{IngestionError, Tokenizer};
use std::sync::Arc;
use tracing::{debug, info};

use crate::inference::call_with_fallback;
use crate::prompts::{SUMMARIZATION_PROMPT, TEXT_TO_COMPRESS_MARKER};
use crate::Result;

/// Tokens a single UTF-8 character can be split across, minus one
const MAX_SPLIT_TOKENS: usize = 3;

/// Reduces oversized document context with one inference call per window
pub struct ChunkedSummarizer {
    client: Arc<dyn InferenceClient>,
    tokenizer: Arc<dyn Tokenizer>,
    options: InferenceOptions,
    window_tokens: usize,
    stride_tokens: usize,
}

impl ChunkedSummarizer {
    pub fn new(client: Arc<dyn InferenceClient>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        let config = SummarizerConfig::default();
        Self {
            client,
            tokenizer,
            options: InferenceOptions::default(),
            window_tokens: config.window_tokens,
            stride_tokens: config.stride_tokens,
        }
    }

    pub fn with_options(mut self, options: InferenceOptions) -> Self {
        self.options = options;
        self
    }

    /// Set window length and stride; a zero stride is treated as one token.
    pub fn with_windowing(mut self, window_tokens: usize, stride_tokens: usize) -> Self {
        self.window_tokens = window_tokens.max(1);
        self.stride_tokens = stride_tokens.max(1);
        self
    }

    pub fn from_config(
        client: Arc<dyn InferenceClient>,
        tokenizer: Arc<dyn Tokenizer>,
        config: &SummarizerConfig,
    ) -> Self {
        Self::new(client, tokenizer).with_windowing(config.window_tokens, config.stride_tokens)
    }

    /// Split `text` into decoded windows starting every `stride_tokens`.
    pub fn windows(&self, text: &str) -> Result<Vec<String>> {
        let tokens = self.tokenizer.encode(text);
        let mut windows = Vec::new();

        for start in (0..tokens.len()).step_by(self.stride_tokens) {
            let end = (start + self.window_tokens).min(tokens.len());
            let at_start = start == 0;
            let at_end = end == tokens.len();
            windows.push(self.decode_window(&tokens[start..end], at_start, at_end)?);
        }

        debug!(tokens = tokens.len(), windows = windows.len(), "Split text into windows");
        Ok(windows)
    }

    /// Decode one window. A window edge that falls inside a multi-byte
    /// character is moved inwards by up to [`MAX_SPLIT_TOKENS`] tokens.
    fn decode_window(&self, tokens: &[usize], at_start: bool, at_end: bool) -> Result<String> {
        let first_error = match self.tokenizer.decode(tokens) {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        let max_head = if at_start { 0 } else { MAX_SPLIT_TOKENS };
        let max_tail = if at_end { 0 } else { MAX_SPLIT_TOKENS };
        for head in 0..=max_head {
            for tail in 0..=max_tail {
                if head + tail == 0 || head + tail >= tokens.len() {
                    continue;
                }
                if let Ok(text) = self.tokenizer.decode(&tokens[head..tokens.len() - tail]) {
                    debug!(head, tail, "Trimmed split characters from window edges");
                    return Ok(text);
                }
            }
        }

        Err(IngestionError::TokenDecoding(first_error.to_string()).into())
    }

    /// Summarise every chunk, in order, joining the window summaries with
    /// blank lines. Failed calls contribute their fallback text.
    pub async fn summarize(&self, chunks: &[String]) -> Result<String> {
        let mut summaries = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let windows = self.windows(chunk)?;
            info!(chunk = index, windows = windows.len(), "Summarizing chunk");

            for window in windows {
                let prompt = SUMMARIZATION_PROMPT.replace(TEXT_TO_COMPRESS_MARKER, &window);
                let messages = [ConversationMessage::user(prompt)];
                summaries.push(call_with_fallback(self.client.as_ref(), &messages, &self.options).await);
            }
        }

        Ok(summaries.join("\n\n"))
    }
}
