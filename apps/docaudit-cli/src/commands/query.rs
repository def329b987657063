//! One-off question about stored files

use anyhow::{bail, Result};
use docaudit_conversation::DocAnalystService;
use docaudit_core::{AppConfig, AuthOutcome, Identity, QueryRequest};
use docaudit_infra::FsBlobStore;
use std::sync::Arc;

use crate::app;
use crate::output;
use crate::StoreArgs;

/// Requests made from the CLI act as the store's user
pub fn local_identity(user: &str) -> AuthOutcome {
    AuthOutcome::Verified(Identity {
        username: user.to_string(),
        ..Default::default()
    })
}

pub async fn run(
    config: &AppConfig,
    store_args: &StoreArgs,
    files: &str,
    question: &str,
    summarize: bool,
) -> Result<()> {
    let parser = app::document_parser(config).await?;
    let client = app::inference_client(config)?;
    let context = app::document_context(config, client.clone(), parser);
    let chat = app::chat_service(config, client);
    let store = Arc::new(FsBlobStore::new(&store_args.store));

    let service = DocAnalystService::new(store, context, chat).with_summarize(summarize);
    let request = QueryRequest {
        sent: chrono::Local::now().naive_local(),
        userid: store_args.user.clone(),
        file_names: files.to_string(),
        user_input: question.to_string(),
        template_name: String::new(),
    };

    let spinner = output::spinner("Thinking...");
    let response = service.query(&request, &local_identity(&store_args.user)).await;
    spinner.finish_and_clear();

    if response.status != "200" {
        bail!("{}", response.ai_response);
    }
    println!("{}", response.ai_response);
    Ok(())
}
