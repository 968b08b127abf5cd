use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template::CompletionType;

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: String,
    pub message: String,
}

/// Assembled prompt in the shape a backend expects: a flat string for
/// text-completion backends, ordered role/message turns for chat ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    Text(String),
    Messages(Vec<ChatEntry>),
}

impl Prompt {
    pub fn into_value(self) -> Value {
        match self {
            Prompt::Text(text) => Value::String(text),
            // ChatEntry serialization is infallible.
            Prompt::Messages(messages) => serde_json::to_value(messages).unwrap_or(Value::Null),
        }
    }
}

// Rough chars-per-token ratio for budget trimming. The exact token count
// belongs to the backend's own tokenizer; the budget only has to be an
// upper bound on how much history is kept.
const APPROX_CHARS_PER_TOKEN: usize = 4;

fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / APPROX_CHARS_PER_TOKEN + 1
}

/// Produces the prompt for one request, trimmed to `budget` tokens.
///
/// Oldest turns are evicted first, chronological order is preserved and
/// the most recent turn is never evicted. `budget == 0` means "no computed
/// budget": the backend relies on its own default and nothing is trimmed.
pub fn assemble(budget: u64, completion_type: CompletionType, history: &[ChatEntry]) -> Prompt {
    let kept = trim(budget, history);
    match completion_type {
        CompletionType::ChatCompletions => Prompt::Messages(kept.to_vec()),
        CompletionType::TextCompletions => Prompt::Text(flatten(kept)),
    }
}

fn trim(budget: u64, history: &[ChatEntry]) -> &[ChatEntry] {
    if budget == 0 || history.is_empty() {
        return history;
    }

    let mut start = history.len() - 1;
    let mut used = entry_tokens(&history[start]);
    while start > 0 {
        let cost = entry_tokens(&history[start - 1]);
        if used + cost > budget as usize {
            break;
        }
        used += cost;
        start -= 1;
    }

    if start > 0 {
        log::debug!("evicted {start} oldest turns to fit budget of {budget}");
    }
    &history[start..]
}

fn entry_tokens(entry: &ChatEntry) -> usize {
    estimate_tokens(&entry.role) + estimate_tokens(&entry.message)
}

fn flatten(entries: &[ChatEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}: {}", entry.role, entry.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: &str, message: &str) -> ChatEntry {
        ChatEntry {
            role: role.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn zero_budget_keeps_everything() {
        let history = vec![turn("user", "a".repeat(400).as_str()); 8];
        match assemble(0, CompletionType::ChatCompletions, &history) {
            Prompt::Messages(messages) => assert_eq!(messages.len(), 8),
            Prompt::Text(_) => panic!("expected messages"),
        }
    }

    #[test]
    fn evicts_oldest_first_and_keeps_order() {
        let history = vec![
            turn("system", &"s".repeat(100)),
            turn("user", &"a".repeat(100)),
            turn("assistant", &"b".repeat(100)),
            turn("user", &"c".repeat(100)),
        ];
        // Each turn costs ~27 tokens; a budget of 60 fits the two newest.
        match assemble(60, CompletionType::ChatCompletions, &history) {
            Prompt::Messages(messages) => {
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[0].role, "assistant");
                assert_eq!(messages[1].role, "user");
            }
            Prompt::Text(_) => panic!("expected messages"),
        }
    }

    #[test]
    fn most_recent_turn_survives_any_budget() {
        let history = vec![turn("user", &"x".repeat(4000))];
        match assemble(1, CompletionType::ChatCompletions, &history) {
            Prompt::Messages(messages) => assert_eq!(messages.len(), 1),
            Prompt::Text(_) => panic!("expected messages"),
        }
    }

    #[test]
    fn text_completions_flatten_in_chronological_order() {
        let history = vec![turn("user", "hello"), turn("assistant", "hi")];
        match assemble(0, CompletionType::TextCompletions, &history) {
            Prompt::Text(text) => assert_eq!(text, "user: hello\nassistant: hi"),
            Prompt::Messages(_) => panic!("expected text"),
        }
    }
}
