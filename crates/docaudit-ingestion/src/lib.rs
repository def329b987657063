//! Document ingestion for DocAudit
//!
//! Turns uploaded files into prompt-ready text:
//!
//! - Format extraction for PDF, TXT, DOCX, RTF, CSV and XLSX uploads
//! - Detection and stripping of the boilerplate report template
//! - Batch parsing with per-file skip semantics
//! - BPE token counting against the inference model's vocabulary

pub mod docx;
pub mod extractors;
pub mod parser;
pub mod rtf;
pub mod table;
pub mod template;
pub mod tokenizer;

// Re-exports
pub use docx::DocxExtractor;
pub use extractors::{
    CsvExtractor, ExtractedDocument, ExtractorRegistry, PdfExtractor, PlainTextExtractor,
    TextExtractor, XlsxExtractor, UNKNOWN_FILE_TYPE,
};
pub use parser::{block_header, DocumentParser, FileOutcome, ParseResult, NO_TEMPLATE_SENTINEL};
pub use rtf::RtfExtractor;
pub use template::{MarkerPhraseDetector, ReferenceTemplate, TemplateDetector, TemplateStripper};
pub use tokenizer::{BpeTokenizer, Tokenizer};

/// Error types for ingestion operations
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    /// A file's bytes could not be parsed as its claimed type
    #[error("Failed to parse {filename}: {reason}")]
    FormatParse { filename: String, reason: String },

    #[error("Token decoding failed: {0}")]
    TokenDecoding(String),

    #[error("Tokenizer initialisation failed: {0}")]
    TokenizerInit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template load failed: {0}")]
    TemplateLoad(String),
}

impl IngestionError {
    pub fn format_parse(filename: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        IngestionError::FormatParse {
            filename: filename.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_display_names_file() {
        let err = IngestionError::format_parse("report.pdf", "invalid file header");
        assert_eq!(err.to_string(), "Failed to parse report.pdf: invalid file header");
    }
}
