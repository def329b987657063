//! Interactive chat about local files

use anyhow::Result;
use colored::Colorize;
use docaudit_conversation::prompts::CHAT_GREETING;
use docaudit_conversation::{ChatService, PreparedContext};
use docaudit_core::{AppConfig, ConversationMessage};
use dialoguer::{theme::ColorfulTheme, Input};
use std::path::PathBuf;

use crate::app;
use crate::output;

pub async fn run(
    config: &AppConfig,
    files: &[PathBuf],
    initial_message: Option<String>,
    summarize: bool,
) -> Result<()> {
    let parser = app::document_parser(config).await?;
    let client = app::inference_client(config)?;
    let context = app::document_context(config, client.clone(), parser);
    let chat = app::chat_service(config, client);

    let uploads = app::read_uploads(files).await?;
    let spinner = output::spinner("Reading documents...");
    let prepared = context.prepare(&uploads, summarize).await;
    spinner.finish_and_clear();
    let prepared = prepared?;

    output::skipped(&prepared.skipped);
    if !uploads.is_empty() {
        output::dimmed(&format!(
            "[{} files, {} tokens of context]",
            uploads.len().saturating_sub(prepared.skipped.len()),
            prepared.total_tokens
        ));
    }

    let mut messages = vec![ConversationMessage::assistant(CHAT_GREETING)];

    // One-shot mode
    if let Some(message) = initial_message {
        send_message(&chat, &mut messages, &message, &prepared).await;
        return Ok(());
    }

    println!("{}: {}", "Assistant".cyan().bold(), CHAT_GREETING);
    println!("{}", "Type 'exit' or 'quit' to end the session.".dimmed());
    println!();

    loop {
        let input: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" | "/exit" | "/quit" => {
                println!("{}", "Goodbye!".green());
                break;
            }
            _ => {}
        }

        send_message(&chat, &mut messages, input, &prepared).await;
    }

    Ok(())
}

async fn send_message(
    chat: &ChatService,
    messages: &mut Vec<ConversationMessage>,
    input: &str,
    prepared: &PreparedContext,
) {
    messages.push(ConversationMessage::user(input));

    let spinner = output::spinner("Thinking...");
    let response = chat
        .respond(messages, &prepared.template_contents, &prepared.additional_context)
        .await;
    spinner.finish_and_clear();

    println!();
    println!("{}: {}", "Assistant".cyan().bold(), response);
    println!();

    messages.push(ConversationMessage::assistant(response));
}
