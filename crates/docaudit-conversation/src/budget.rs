//! Prompt size budgeting
//!
//! Two policies applied in order: an optional cap on the number of most
//! recent messages kept, then dropping the oldest message while the JSON
//! serialization of the conversation is longer than a character ceiling.

use docaudit_core::{BudgetConfig, ConversationMessage};
use tracing::info;

use crate::Result;

/// Enforces history and serialized-size limits on a conversation
#[derive(Debug, Clone)]
pub struct ConversationBudgeter {
    max_serialized_length: usize,
    max_turns: Option<usize>,
}

impl ConversationBudgeter {
    /// Create a budgeter with only the size ceiling
    pub fn new(max_serialized_length: usize) -> Self {
        Self {
            max_serialized_length,
            max_turns: None,
        }
    }

    /// Keep at most `max_turns` most recent messages before the size check.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    /// Budget for chat flows: size ceiling only
    pub fn chat(config: &BudgetConfig) -> Self {
        Self::new(config.max_serialized_length)
    }

    /// Budget for audit rounds: turn cap, then size ceiling
    pub fn audit(config: &BudgetConfig) -> Self {
        Self::new(config.max_serialized_length).with_max_turns(config.audit_max_turns)
    }

    pub fn max_serialized_length(&self) -> usize {
        self.max_serialized_length
    }

    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }

    /// Length in characters of the compact JSON array of `messages`
    pub fn serialized_length(messages: &[ConversationMessage]) -> Result<usize> {
        let mut total = 2 + messages.len().saturating_sub(1);
        for message in messages {
            total += message_length(message)?;
        }
        Ok(total)
    }

    /// Trim `messages` from the head until both limits hold.
    ///
    /// The last remaining message is never dropped, so a single message
    /// longer than the ceiling is returned as is.
    pub fn enforce(&self, mut messages: Vec<ConversationMessage>) -> Result<Vec<ConversationMessage>> {
        if let Some(max_turns) = self.max_turns {
            if messages.len() > max_turns {
                let excess = messages.len() - max_turns;
                messages.drain(..excess);
            }
        }

        let mut lengths = messages
            .iter()
            .map(message_length)
            .collect::<Result<std::collections::VecDeque<_>>>()?;
        let mut total = Self::serialized_length(&messages)?;
        info!(
            messages = messages.len(),
            serialized_length = total,
            max = self.max_serialized_length,
            "Message length"
        );

        let mut dropped = 0;
        while total > self.max_serialized_length && lengths.len() > 1 {
            if let Some(length) = lengths.pop_front() {
                // The element plus its separating comma
                total -= length + 1;
                dropped += 1;
                info!(serialized_length = total, "Prompt too large, dropped oldest message");
            }
        }
        messages.drain(..dropped);

        Ok(messages)
    }
}

impl Default for ConversationBudgeter {
    fn default() -> Self {
        Self::chat(&BudgetConfig::default())
    }
}

fn message_length(message: &ConversationMessage) -> Result<usize> {
    Ok(serde_json::to_string(message)?.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(sizes: &[usize]) -> Vec<ConversationMessage> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, size)| {
                let content = "x".repeat(*size);
                if i % 2 == 0 {
                    ConversationMessage::user(content)
                } else {
                    ConversationMessage::assistant(content)
                }
            })
            .collect()
    }

    #[test]
    fn test_serialized_length_matches_serde() {
        let messages = conversation(&[3, 10, 0]);
        let expected = serde_json::to_string(&messages).unwrap().chars().count();
        assert_eq!(ConversationBudgeter::serialized_length(&messages).unwrap(), expected);
        assert_eq!(ConversationBudgeter::serialized_length(&[]).unwrap(), 2);
    }

    #[test]
    fn test_multibyte_content_counts_characters() {
        let messages = vec![ConversationMessage::user("héllo")];
        let json = serde_json::to_string(&messages).unwrap();
        assert!(json.len() > json.chars().count());
        assert_eq!(
            ConversationBudgeter::serialized_length(&messages).unwrap(),
            json.chars().count()
        );
    }

    #[test]
    fn test_under_budget_is_untouched() {
        let messages = conversation(&[10, 10, 10]);
        let budgeter = ConversationBudgeter::new(10_000);
        assert_eq!(budgeter.enforce(messages.clone()).unwrap(), messages);
    }

    #[test]
    fn test_drops_oldest_until_under_ceiling() {
        let messages = conversation(&[500, 500, 100]);
        let budgeter = ConversationBudgeter::new(700);

        let trimmed = budgeter.enforce(messages.clone()).unwrap();
        assert_eq!(trimmed, messages[1..].to_vec());
        assert!(ConversationBudgeter::serialized_length(&trimmed).unwrap() <= 700);
    }

    #[test]
    fn test_single_oversized_message_is_kept() {
        let messages = conversation(&[50, 5_000]);
        let budgeter = ConversationBudgeter::new(100);

        let trimmed = budgeter.enforce(messages.clone()).unwrap();
        assert_eq!(trimmed, vec![messages[1].clone()]);
    }

    #[test]
    fn test_turn_cap_applies_first() {
        let messages = conversation(&[1, 2, 3, 4, 5]);
        let budgeter = ConversationBudgeter::new(240_000).with_max_turns(2);

        let trimmed = budgeter.enforce(messages.clone()).unwrap();
        assert_eq!(trimmed, messages[3..].to_vec());
    }

    #[test]
    fn test_budget_invariant_over_many_shapes() {
        let budgeter = ConversationBudgeter::new(1_000);
        for sizes in [&[900, 900, 900][..], &[10; 40][..], &[2_000][..], &[400, 300, 200, 100][..]] {
            let trimmed = budgeter.enforce(conversation(sizes)).unwrap();
            let length = ConversationBudgeter::serialized_length(&trimmed).unwrap();
            assert!(length <= 1_000 || trimmed.len() == 1, "sizes {sizes:?} left {length}");
        }
    }

    #[test]
    fn test_profiles_from_config() {
        let config = BudgetConfig::default();
        assert_eq!(ConversationBudgeter::chat(&config).max_turns(), None);

        let audit = ConversationBudgeter::audit(&config);
        assert_eq!(audit.max_turns(), Some(2));
        assert_eq!(audit.max_serialized_length(), 240_000);
    }
}
