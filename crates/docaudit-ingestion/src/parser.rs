//! Batch document parsing
//!
//! Runs every uploaded file through its extractor, separates the report
//! template (if any) from ordinary content, and counts tokens over the
//! aggregate.

use docaudit_core::UploadedFile;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::extractors::{ExtractedDocument, ExtractorRegistry};
use crate::tokenizer::Tokenizer;

/// Template contents reported when no upload matched the report template
pub const NO_TEMPLATE_SENTINEL: &str = "No rimon Template Given by User.";

/// Length of the content preview written to the logs
const LOG_PREVIEW_CHARS: usize = 200;

/// What happened to a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Extracted(ExtractedDocument),
    Skipped { filename: String, reason: String },
}

/// Aggregate result of parsing one batch of uploads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// One source-labelled block per non-template file, in upload order
    pub file_contents: Vec<String>,
    /// Stripped template text, or [`NO_TEMPLATE_SENTINEL`]
    pub template_contents: String,
    /// Tokens in `template_contents` plus tokens in the joined blocks
    pub total_tokens: usize,
    /// Names of files that could not be parsed
    #[serde(default)]
    pub skipped: Vec<String>,
}

impl ParseResult {
    /// All content blocks joined into one context string
    pub fn joined_contents(&self) -> String {
        self.file_contents.concat()
    }

    pub fn has_template(&self) -> bool {
        self.template_contents != NO_TEMPLATE_SENTINEL
    }
}

/// Header line introducing a file's content block
pub fn block_header(filename: &str) -> String {
    format!("\n\n{} has the following contents:\n\n", filename)
}

/// Orchestrates format extraction and template separation over a batch
pub struct DocumentParser {
    registry: Arc<ExtractorRegistry>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl DocumentParser {
    pub fn new(registry: Arc<ExtractorRegistry>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { registry, tokenizer }
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Extract a single file, converting a parse failure into a skip.
    pub async fn extract(&self, file: &UploadedFile) -> FileOutcome {
        match self.registry.extract(file).await {
            Ok(document) => {
                let preview: String = document.text.chars().take(LOG_PREVIEW_CHARS).collect();
                info!(
                    file = %file.name,
                    template = document.is_template_match,
                    contents = %preview,
                    "Loaded file"
                );
                FileOutcome::Extracted(document)
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "Skipping file that could not be parsed");
                FileOutcome::Skipped {
                    filename: file.name.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Parse a batch of uploads. Individual failures never fail the batch.
    pub async fn parse(&self, files: &[UploadedFile]) -> ParseResult {
        let mut file_contents = Vec::new();
        let mut template_contents: Option<String> = None;
        let mut skipped = Vec::new();

        for file in files {
            match self.extract(file).await {
                FileOutcome::Extracted(document) if document.is_template_match => {
                    // A later template upload replaces an earlier one
                    template_contents = Some(document.text);
                }
                FileOutcome::Extracted(document) => {
                    let mut block = block_header(&document.source_name);
                    block.push_str(&document.text);
                    file_contents.push(block);
                }
                FileOutcome::Skipped { filename, .. } => skipped.push(filename),
            }
        }

        let template_contents =
            template_contents.unwrap_or_else(|| NO_TEMPLATE_SENTINEL.to_string());
        let total_tokens = self.tokenizer.count_tokens(&template_contents)
            + self.tokenizer.count_tokens(&file_contents.concat());

        info!(
            files = files.len(),
            blocks = file_contents.len(),
            skipped = skipped.len(),
            total_tokens,
            "Parsed uploads"
        );

        ParseResult {
            file_contents,
            template_contents,
            total_tokens,
            skipped,
        }
    }
}
