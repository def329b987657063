//! Local document summarization

use anyhow::Result;
use docaudit_core::AppConfig;
use std::path::PathBuf;
use std::time::Instant;

use crate::app;
use crate::output;

pub async fn run(config: &AppConfig, files: &[PathBuf]) -> Result<()> {
    let parser = app::document_parser(config).await?;
    let client = app::inference_client(config)?;
    let summarizer = app::summarizer(config, client, &parser);

    let uploads = app::read_uploads(files).await?;
    let parsed = parser.parse(&uploads).await;
    output::skipped(&parsed.skipped);

    let started = Instant::now();
    let spinner = output::spinner("Summarizing...");
    let summary = summarizer.summarize(&parsed.file_contents).await;
    spinner.finish_and_clear();
    let summary = summary?;

    println!("{}", summary);
    println!();
    output::dimmed(&format!(
        "[{} tokens in, {}]",
        parsed.total_tokens,
        output::format_duration(started.elapsed().as_millis() as u64)
    ));
    Ok(())
}
