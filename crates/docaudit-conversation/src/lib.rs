//! Conversation flows for DocAudit
//!
//! Everything between parsed documents and the inference endpoint:
//!
//! - Prompt templates and their assembly into message lists
//! - History and serialized-size budgeting
//! - Chunked summarization of oversized context
//! - The doc-analyst chat flow and the style-guide audit stream
//! - Request services tying blob storage, parsing and flows together

pub mod assembler;
pub mod audit;
pub mod budget;
pub mod chat;
pub mod context;
pub mod feedback;
pub mod inference;
pub mod prompts;
pub mod service;
pub mod style_guides;
pub mod summarizer;

// Re-exports
pub use assembler::PromptAssembler;
pub use audit::{audit_request_message, AuditOrchestrator};
pub use budget::ConversationBudgeter;
pub use chat::ChatService;
pub use context::{DocumentContext, PreparedContext};
pub use feedback::FeedbackService;
pub use inference::{call_with_fallback, complete_logged, FAILURE_FALLBACK, TIMEOUT_FALLBACK};
pub use service::{fetch_user_files, presign_upload, DocAnalystService, DocAuditService};
pub use style_guides::{StyleGuide, StyleGuideLibrary, DEFAULT_STYLE_GUIDES};
pub use summarizer::ChunkedSummarizer;

use docaudit_core::{BlobStoreError, InferenceError};
use docaudit_ingestion::IngestionError;

/// Error types for conversation operations
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Style guide {name} could not be loaded: {reason}")]
    StyleGuide { name: String, reason: String },

    #[error("Blob store error: {0}")]
    BlobStore(#[from] BlobStoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConversationError>;
