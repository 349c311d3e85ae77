//! Chat completion wire types and the prompt arithmetic around them.
//!

use crate::infrastructure::entities;
use serde::{Deserialize, Serialize};

/// How many prior messages are replayed to the model.
pub const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl From<entities::Message> for ChatMessage {
    fn from(m: entities::Message) -> Self {
        Self {
            content: m.content,
            role: match m.role {
                entities::MessageRole::User => Role::User,
                entities::MessageRole::Assistant => Role::Assistant,
            },
        }
    }
}

/// Body of a chat completions call, minus the credentials.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: i64,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Builds a request from stored settings; temperature is kept in
    /// hundredths and sent as a fraction.
    pub fn from_settings(settings: &entities::Settings, messages: Vec<ChatMessage>) -> Self {
        CompletionRequest {
            model: settings.default_model.clone(),
            messages,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature as f32 / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}

/// Rough token count for text we store ourselves: one token per four chars.
pub fn estimate_tokens(text: &str) -> i64 {
    let chars = text.chars().count() as i64;
    (chars + 3) / 4
}

/// Price in cents at $0.10 per thousand tokens, rounded up.
pub fn usage_cost_cents(total_tokens: i64) -> i64 {
    if total_tokens <= 0 {
        return 0;
    }
    (total_tokens + 9_999) / 10_000
}

/// The tail of the conversation that is replayed, oldest first.
pub fn history_window(messages: Vec<entities::Message>) -> Vec<ChatMessage> {
    let skip = messages.len().saturating_sub(HISTORY_WINDOW);
    messages
        .into_iter()
        .skip(skip)
        .map(ChatMessage::from)
        .collect()
}

pub fn augment_prompt(content: &str, context: &str) -> String {
    if context.is_empty() {
        return content.to_owned();
    }
    format!("{content}\n\nReference the following documents for context:\n{context}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::entities;
    use chrono::Utc;

    fn message(id: i64, role: entities::MessageRole, content: &str) -> entities::Message {
        entities::Message {
            id,
            conversation_id: 1,
            content: content.to_string(),
            role,
            document_reference: None,
            token_count: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_chat_message_from_user_entity() {
        let chat_message: ChatMessage = message(1, entities::MessageRole::User, "Hello").into();
        assert_eq!(chat_message.role, Role::User);
        assert_eq!(chat_message.content, "Hello");
    }

    #[test]
    fn test_chat_message_from_assistant_entity() {
        let chat_message: ChatMessage =
            message(2, entities::MessageRole::Assistant, "Hi there!").into();
        assert_eq!(chat_message.role, Role::Assistant);
        assert_eq!(chat_message.content, "Hi there!");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::user("x")).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("Hello"), 2);
        assert_eq!(estimate_tokens("Hi there"), 2);
        assert_eq!(estimate_tokens("abcdefghi"), 3);
    }

    #[test]
    fn test_usage_cost_cents() {
        assert_eq!(usage_cost_cents(0), 0);
        assert_eq!(usage_cost_cents(8), 1);
        assert_eq!(usage_cost_cents(10_000), 1);
        assert_eq!(usage_cost_cents(10_001), 2);
    }

    #[test]
    fn test_history_window_keeps_last_ten_in_order() {
        let messages: Vec<_> = (1..=12)
            .map(|i| message(i, entities::MessageRole::User, &i.to_string()))
            .collect();

        let history = history_window(messages);

        assert_eq!(history.len(), HISTORY_WINDOW);
        assert_eq!(history.first().unwrap().content, "3");
        assert_eq!(history.last().unwrap().content, "12");
    }

    #[test]
    fn test_augment_prompt() {
        assert_eq!(augment_prompt("Hi", ""), "Hi");
        assert_eq!(
            augment_prompt("Hi", "\n\nDocument: a\nContent: b\n"),
            "Hi\n\nReference the following documents for context:\n\n\nDocument: a\nContent: b\n"
        );
    }

    #[test]
    fn test_request_temperature_is_fractional() {
        let settings = entities::Settings {
            id: 1,
            user_id: 1,
            groq_api_key: None,
            default_model: "llama3-8b-8192".to_string(),
            max_tokens: 4096,
            temperature: 70,
            theme: "light".to_string(),
            updated_at: Utc::now(),
        };

        let request = CompletionRequest::from_settings(&settings, vec![ChatMessage::user("Hello")]);

        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.model, "llama3-8b-8192");
        assert_eq!(request.max_tokens, 4096);
    }
}
