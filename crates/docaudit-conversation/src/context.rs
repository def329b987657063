//! Document context preparation
//!
//! Parses a request's uploads and produces the strings the prompt
//! templates need, optionally summarising the document blocks first.

use docaudit_core::UploadedFile;
use docaudit_ingestion::DocumentParser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::summarizer::ChunkedSummarizer;
use crate::Result;

/// Context ready for prompt assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedContext {
    /// Joined or summarised document blocks, empty when nothing was uploaded
    pub additional_context: String,
    /// Stripped template answers or the no-template sentinel
    pub template_contents: String,
    /// Token count of the parsed content before any summarisation
    pub total_tokens: usize,
    #[serde(default)]
    pub skipped: Vec<String>,
}

/// Turns uploaded files into prompt context
pub struct DocumentContext {
    parser: Arc<DocumentParser>,
    summarizer: Option<Arc<ChunkedSummarizer>>,
}

impl DocumentContext {
    pub fn new(parser: Arc<DocumentParser>) -> Self {
        Self {
            parser,
            summarizer: None,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<ChunkedSummarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub async fn prepare(&self, files: &[UploadedFile], summarize: bool) -> Result<PreparedContext> {
        let parsed = self.parser.parse(files).await;

        let additional_context = match (&self.summarizer, summarize) {
            (Some(summarizer), true) => {
                info!(blocks = parsed.file_contents.len(), "Summarizing document context");
                summarizer.summarize(&parsed.file_contents).await?
            }
            (None, true) => {
                warn!("Summarization requested but no summarizer is configured");
                parsed.joined_contents()
            }
            (_, false) => parsed.joined_contents(),
        };

        Ok(PreparedContext {
            additional_context,
            template_contents: parsed.template_contents,
            total_tokens: parsed.total_tokens,
            skipped: parsed.skipped,
        })
    }
}
