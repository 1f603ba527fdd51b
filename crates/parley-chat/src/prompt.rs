//! Prompt template: the system instruction followed by the conversation.
//!
//! The rendered context is always `[system, turn_1, …, turn_n]`, in the same
//! order the turns were appended.

use parley_core::config::schema::DEFAULT_SYSTEM_PROMPT;
use parley_core::types::{PromptMessage, Turn};
use parley_core::utils;

/// Placeholder in the system instruction replaced with today's date.
const DATE_PLACEHOLDER: &str = "{date}";

/// A fixed system instruction plus a placeholder for the message history.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    system: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    /// The instruction with placeholders filled in.
    pub fn system_instruction(&self) -> String {
        if self.system.contains(DATE_PLACEHOLDER) {
            self.system.replace(DATE_PLACEHOLDER, &utils::today_date())
        } else {
            self.system.clone()
        }
    }

    /// Render the full prompt context for a model call.
    pub fn render(&self, history: &[Turn]) -> Vec<PromptMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(PromptMessage::system(self.system_instruction()));
        messages.extend(history.iter().map(PromptMessage::from));
        messages
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::PromptRole;

    #[test]
    fn render_puts_system_first_then_history_in_order() {
        let template = PromptTemplate::new("Be terse.");
        let history = vec![
            Turn::user("a"),
            Turn::assistant("reply to a"),
            Turn::user("b"),
        ];

        let messages = template.render(&history);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, PromptRole::System);
        assert_eq!(messages[0].content, "Be terse.");
        let rest: Vec<(PromptRole, &str)> = messages[1..]
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            rest,
            vec![
                (PromptRole::User, "a"),
                (PromptRole::Assistant, "reply to a"),
                (PromptRole::User, "b"),
            ]
        );
    }

    #[test]
    fn render_empty_history() {
        let messages = PromptTemplate::default().render(&[]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn date_placeholder_is_filled() {
        let template = PromptTemplate::new("Today is {date}.");
        let instruction = template.system_instruction();
        assert!(!instruction.contains("{date}"));
        assert_eq!(instruction, format!("Today is {}.", utils::today_date()));
    }
}
