//! Doc-analyst chat flow

use docaudit_core::{BudgetConfig, ConversationMessage, InferenceClient, InferenceOptions};
use std::sync::Arc;
use tracing::{info, warn};

use crate::assembler::PromptAssembler;
use crate::budget::ConversationBudgeter;
use crate::inference::{call_with_fallback, FAILURE_FALLBACK};

/// Answers questions about uploaded documents. Never fails: every error
/// path yields fallback text.
pub struct ChatService {
    client: Arc<dyn InferenceClient>,
    assembler: PromptAssembler,
    budgeter: ConversationBudgeter,
    options: InferenceOptions,
}

impl ChatService {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            assembler: PromptAssembler::chat(),
            budgeter: ConversationBudgeter::chat(&BudgetConfig::default()),
            options: InferenceOptions::default(),
        }
    }

    pub fn with_budget(mut self, config: &BudgetConfig) -> Self {
        self.budgeter = ConversationBudgeter::chat(config);
        self
    }

    pub fn with_options(mut self, options: InferenceOptions) -> Self {
        self.options = options;
        self
    }

    /// Use another assembler profile, e.g. the audit follow-up prompt
    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Answer the newest user turn of `messages`.
    ///
    /// `messages` starts with the session greeting, which is not sent.
    pub async fn respond(
        &self,
        messages: &[ConversationMessage],
        template_content: &str,
        additional_context: &str,
    ) -> String {
        let assembled = self
            .assembler
            .assemble(messages, template_content, additional_context);
        if assembled.is_empty() {
            warn!("No messages left to send after prompt assembly");
            return FAILURE_FALLBACK.to_string();
        }

        let prompt = match self.budgeter.enforce(assembled) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Could not measure prompt size");
                return FAILURE_FALLBACK.to_string();
            }
        };

        info!(
            messages = prompt.len(),
            with_files = !additional_context.is_empty(),
            "Sending chat message"
        );
        call_with_fallback(self.client.as_ref(), &prompt, &self.options).await
    }
}
