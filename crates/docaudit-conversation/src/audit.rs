//! Style-guide audit orchestration
//!
//! One inference round per style guide, in order. Every round's answer is
//! emitted as soon as it arrives and stays in the history so the next
//! round sees it. A timeout degrades the round to fallback text; any other
//! failure ends the stream with an error event.

use docaudit_core::{AuditEvent, BudgetConfig, ConversationMessage, InferenceClient, InferenceOptions};
use futures::Stream;
use std::sync::Arc;
use tracing::{error, info};

use crate::assembler::PromptAssembler;
use crate::budget::ConversationBudgeter;
use crate::inference::{complete_logged, TIMEOUT_FALLBACK};
use crate::style_guides::StyleGuideLibrary;

/// The user turn that opens audit round `round` of `total`
pub fn audit_request_message(round: usize, total: usize, guide_name: &str) -> String {
    format!(
        "Please review my doc against style guide section [{} of {}] {}",
        round, total, guide_name
    )
}

/// Drives the multi-round audit conversation
#[derive(Clone)]
pub struct AuditOrchestrator {
    client: Arc<dyn InferenceClient>,
    library: Arc<StyleGuideLibrary>,
    assembler: PromptAssembler,
    budgeter: ConversationBudgeter,
    options: InferenceOptions,
    provider_label: String,
}

impl AuditOrchestrator {
    pub fn new(client: Arc<dyn InferenceClient>, library: Arc<StyleGuideLibrary>) -> Self {
        Self {
            client,
            library,
            assembler: PromptAssembler::audit(),
            budgeter: ConversationBudgeter::audit(&BudgetConfig::default()),
            options: InferenceOptions::default(),
            provider_label: "SCOTi".to_string(),
        }
    }

    pub fn with_budget(mut self, config: &BudgetConfig) -> Self {
        self.budgeter = ConversationBudgeter::audit(config);
        self
    }

    pub fn with_options(mut self, options: InferenceOptions) -> Self {
        self.options = options;
        self
    }

    /// Name announced in the starting event
    pub fn with_provider_label(mut self, label: impl Into<String>) -> Self {
        self.provider_label = label.into();
        self
    }

    /// Run the audit lazily. Each poll past the starting event performs
    /// one round. An empty `filter` audits against every default guide.
    pub fn run(
        &self,
        filter: Vec<String>,
        additional_context: String,
    ) -> impl Stream<Item = AuditEvent> + Send + 'static {
        let this = self.clone();

        async_stream::stream! {
            yield AuditEvent::starting(&this.provider_label);

            let guides = match this.library.load(&filter).await {
                Ok(guides) => guides,
                Err(e) => {
                    error!(error = %e, "Failed to load style guides");
                    yield AuditEvent::error(&e);
                    return;
                }
            };

            let total = guides.len();
            let mut history: Vec<ConversationMessage> = Vec::new();

            for (index, guide) in guides.iter().enumerate() {
                let round = index + 1;
                history.push(ConversationMessage::user(audit_request_message(round, total, &guide.name)));
                info!(round, total, guide = %guide.name, "Sending audit round");

                let assembled = this.assembler.assemble(&history, &guide.text, &additional_context);
                let prompt = match this.budgeter.enforce(assembled) {
                    Ok(prompt) => prompt,
                    Err(e) => {
                        yield AuditEvent::error(&e);
                        return;
                    }
                };

                let response = match complete_logged(this.client.as_ref(), &prompt, &this.options).await {
                    Ok(response) => response,
                    Err(e) if e.is_timeout() => TIMEOUT_FALLBACK.to_string(),
                    Err(e) => {
                        yield AuditEvent::error(&e);
                        return;
                    }
                };

                yield AuditEvent::result(response.clone());
                history.push(ConversationMessage::assistant(response));
            }

            info!(rounds = total, "Audit complete");
        }
    }
}
