//! Component wiring shared by the commands

use anyhow::{Context, Result};
use docaudit_conversation::{
    AuditOrchestrator, ChatService, ChunkedSummarizer, DocumentContext, StyleGuideLibrary,
};
use docaudit_core::{AppConfig, InferenceClient, UploadedFile};
use docaudit_ingestion::{
    BpeTokenizer, DocumentParser, ExtractorRegistry, ReferenceTemplate, TemplateStripper,
    Tokenizer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub fn load_config(path: Option<&str>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => AppConfig::load().context("Failed to load configuration from environment")?,
    };
    Ok(config)
}

/// Load both reference templates, or disable stripping when either is
/// missing
async fn template_stripper(config: &AppConfig) -> Option<Arc<TemplateStripper>> {
    let (Some(new_path), Some(old_path)) = (
        config.ingestion.new_template_path.as_deref(),
        config.ingestion.old_template_path.as_deref(),
    ) else {
        warn!("Reference templates not configured, template stripping disabled");
        return None;
    };

    let mut references = Vec::with_capacity(2);
    for path in [new_path, old_path] {
        match ReferenceTemplate::load(path).await {
            Ok(template) => references.push(template),
            Err(e) => {
                warn!(error = %e, "Reference template unavailable, template stripping disabled");
                return None;
            }
        }
    }
    Some(Arc::new(TemplateStripper::new(references)))
}

pub async fn document_parser(config: &AppConfig) -> Result<Arc<DocumentParser>> {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(
        BpeTokenizer::for_encoding(&config.ingestion.encoding)
            .context("Failed to initialise tokenizer")?,
    );

    let registry = match template_stripper(config).await {
        Some(stripper) => ExtractorRegistry::with_template_stripper(stripper),
        None => ExtractorRegistry::with_defaults(),
    };

    Ok(Arc::new(DocumentParser::new(Arc::new(registry), tokenizer)))
}

pub fn inference_client(config: &AppConfig) -> Result<Arc<dyn InferenceClient>> {
    docaudit_infra::build_client(&config.inference).context("Failed to build inference client")
}

pub fn summarizer(
    config: &AppConfig,
    client: Arc<dyn InferenceClient>,
    parser: &DocumentParser,
) -> Arc<ChunkedSummarizer> {
    Arc::new(
        ChunkedSummarizer::from_config(client, parser.tokenizer().clone(), &config.summarizer)
            .with_options(config.inference.options()),
    )
}

pub fn document_context(
    config: &AppConfig,
    client: Arc<dyn InferenceClient>,
    parser: Arc<DocumentParser>,
) -> Arc<DocumentContext> {
    let summarizer = summarizer(config, client, &parser);
    Arc::new(DocumentContext::new(parser).with_summarizer(summarizer))
}

pub fn chat_service(config: &AppConfig, client: Arc<dyn InferenceClient>) -> Arc<ChatService> {
    Arc::new(
        ChatService::new(client)
            .with_budget(&config.budget)
            .with_options(config.inference.options()),
    )
}

pub fn style_guides(config: &AppConfig) -> Arc<StyleGuideLibrary> {
    Arc::new(StyleGuideLibrary::new(&config.ingestion.style_guide_dir))
}

pub fn audit_orchestrator(config: &AppConfig, client: Arc<dyn InferenceClient>) -> AuditOrchestrator {
    AuditOrchestrator::new(client, style_guides(config))
        .with_budget(&config.budget)
        .with_options(config.inference.options())
        .with_provider_label(config.inference.provider_label.as_str())
}

/// Read local files into uploads named after their file names
pub async fn read_uploads(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(UploadedFile::new(file_name(path), bytes));
    }
    info!(files = files.len(), "Read local files");
    Ok(files)
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
