//! Prompt assembly
//!
//! Wraps every user turn in a prompt template and injects live document
//! context into the newest user turn only. Older turns keep their
//! template with the context markers left unsubstituted, so history never
//! re-sends the full documents.

use docaudit_core::{ConversationMessage, MessageRole};
use tracing::debug;

use crate::prompts::{
    ADDITIONAL_CONTEXT_MARKER, CHAT_PROMPT_WITHOUT_FILES, CHAT_PROMPT_WITH_FILES,
    DOC_AUDIT_CHAT_PROMPT_WITH_FILES, DOC_AUDIT_PROMPT_WITH_FILES,
    PREVIOUS_RECOMMENDATIONS_MARKER, TEMPLATE_MARKER, USER_INPUT_MARKER,
};

/// Builds the message list sent to inference from a raw conversation
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    with_files: &'static str,
    without_files: &'static str,
    /// Marker receiving the `template_content` argument
    content_marker: &'static str,
    drop_oldest: bool,
}

impl PromptAssembler {
    /// Doc-analyst chat: file-aware template when context is present, and
    /// the leading greeting is dropped.
    pub fn chat() -> Self {
        Self {
            with_files: CHAT_PROMPT_WITH_FILES,
            without_files: CHAT_PROMPT_WITHOUT_FILES,
            content_marker: TEMPLATE_MARKER,
            drop_oldest: true,
        }
    }

    /// Audit round: the style guide goes into the template slot.
    pub fn audit() -> Self {
        Self {
            with_files: DOC_AUDIT_PROMPT_WITH_FILES,
            without_files: DOC_AUDIT_PROMPT_WITH_FILES,
            content_marker: TEMPLATE_MARKER,
            drop_oldest: false,
        }
    }

    /// Follow-up after an audit: the previous recommendations go into the
    /// template slot.
    pub fn audit_follow_up() -> Self {
        Self {
            with_files: DOC_AUDIT_CHAT_PROMPT_WITH_FILES,
            without_files: DOC_AUDIT_CHAT_PROMPT_WITH_FILES,
            content_marker: PREVIOUS_RECOMMENDATIONS_MARKER,
            drop_oldest: false,
        }
    }

    /// Template used for user turns given this context
    pub fn template_for(&self, additional_context: &str) -> &'static str {
        if additional_context.is_empty() {
            self.without_files
        } else {
            self.with_files
        }
    }

    /// Assemble a raw conversation into prompt messages.
    ///
    /// `messages` must hold the users' own words; every user turn is
    /// wrapped exactly once here. Assistant turns pass through unchanged.
    pub fn assemble(
        &self,
        messages: &[ConversationMessage],
        template_content: &str,
        additional_context: &str,
    ) -> Vec<ConversationMessage> {
        let template = self.template_for(additional_context);

        let mut assembled: Vec<ConversationMessage> = messages
            .iter()
            .map(|message| match message.role {
                MessageRole::User => ConversationMessage::user(
                    template.replace(USER_INPUT_MARKER, &message.content),
                ),
                MessageRole::Assistant => message.clone(),
            })
            .collect();

        if let Some(last_user) = assembled.iter_mut().rev().find(|m| m.is_user()) {
            last_user.content = last_user
                .content
                .replace(self.content_marker, template_content)
                .replace(ADDITIONAL_CONTEXT_MARKER, additional_context);
        }

        if self.drop_oldest && !assembled.is_empty() {
            assembled.remove(0);
        }

        debug!(
            messages = assembled.len(),
            with_files = !additional_context.is_empty(),
            "Assembled prompt"
        );
        assembled
    }
}
