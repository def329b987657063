//! Local document parsing

use anyhow::Result;
use docaudit_core::AppConfig;
use std::path::PathBuf;

use crate::app;
use crate::output;

pub async fn run(config: &AppConfig, files: &[PathBuf], json: bool) -> Result<()> {
    let parser = app::document_parser(config).await?;
    let uploads = app::read_uploads(files).await?;
    let result = parser.parse(&uploads).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::section("Documents");
    if result.file_contents.is_empty() {
        output::dimmed("No document content extracted");
    }
    for block in &result.file_contents {
        println!("{}", output::truncate(block.trim(), 600));
        println!();
    }

    output::section("Template");
    if result.has_template() {
        println!("{}", result.template_contents);
    } else {
        output::dimmed(&result.template_contents);
    }

    output::skipped(&result.skipped);

    println!();
    output::key_value("Total tokens", &result.total_tokens.to_string());
    Ok(())
}
