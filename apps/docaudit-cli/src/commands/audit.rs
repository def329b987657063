//! Style-guide audit of a stored document

use anyhow::{bail, Result};
use docaudit_conversation::DocAuditService;
use docaudit_core::{AppConfig, AuditStatus, DocAuditRequest};
use docaudit_infra::FsBlobStore;
use futures::StreamExt;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Instant;

use crate::app;
use crate::commands::query::local_identity;
use crate::output;
use crate::StoreArgs;

pub async fn run(
    config: &AppConfig,
    store_args: &StoreArgs,
    file: &str,
    guides: &str,
    summarize: bool,
) -> Result<()> {
    let parser = app::document_parser(config).await?;
    let client = app::inference_client(config)?;
    let context = app::document_context(config, client.clone(), parser);
    let orchestrator = app::audit_orchestrator(config, client);
    let store = Arc::new(FsBlobStore::new(&store_args.store));

    let service = DocAuditService::new(store, context, orchestrator).with_summarize(summarize);
    let request = DocAuditRequest {
        sent: chrono::Local::now().naive_local(),
        userid: store_args.user.clone(),
        file_name: file.to_string(),
        style_guide_file_names: guides.to_string(),
        template_name: String::new(),
    };

    let started = Instant::now();
    let events = service.audit(request, local_identity(&store_args.user));
    futures::pin_mut!(events);

    let mut rounds = 0usize;
    let mut failure = None;
    let mut spinner: Option<ProgressBar> = None;
    while let Some(event) = events.next().await {
        if let Some(bar) = spinner.take() {
            bar.finish_and_clear();
        }
        match event.status {
            AuditStatus::Starting => {
                output::dimmed(&event.ai_response);
            }
            AuditStatus::Interim => {
                rounds += 1;
                output::section(&format!("Finding {}", rounds));
                println!("{}", event.ai_response);
            }
            AuditStatus::Error => {
                output::error(&event.ai_response);
                failure = Some(event.ai_response);
                break;
            }
        }
        spinner = Some(output::spinner("Auditing..."));
    }
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    if let Some(message) = failure {
        bail!("Audit failed: {}", message);
    }

    println!();
    output::success(&format!(
        "Audit finished with {} findings in {}",
        rounds,
        output::format_duration(started.elapsed().as_millis() as u64)
    ));
    Ok(())
}
