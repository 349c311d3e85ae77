//! Database entities

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The seeded administrator account; also owns everything created through
/// the public surface.
pub const ADMIN_USER_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub content: String,
    pub role: MessageRole,
    pub document_reference: Option<String>,
    pub token_count: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub content: String,
    pub mime_type: String,
    /// Kilobytes, rounded up.
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ApiKey {
    pub id: i64,
    pub name: String,
    pub key_value: String,
    pub user_id: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Webhook {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Analytics {
    pub id: i64,
    pub user_id: i64,
    pub tokens_used: i64,
    /// Cents.
    pub cost: i64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Settings {
    pub id: i64,
    pub user_id: i64,
    pub groq_api_key: Option<String>,
    pub default_model: String,
    pub max_tokens: i64,
    /// Hundredths, 0..=100.
    pub temperature: i64,
    pub theme: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub criteria: String,
    pub threshold: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserBadge {
    pub id: i64,
    pub user_id: i64,
    pub badge_id: i64,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserAchievement {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub count: i64,
    pub updated_at: DateTime<Utc>,
}

/// Values for a row about to be inserted; ids and timestamps are assigned by
/// the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: i64,
    pub content: String,
    pub role: MessageRole,
    pub document_reference: Option<String>,
    pub token_count: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub user_id: i64,
    pub content: String,
    pub mime_type: String,
    pub size: i64,
}

#[derive(Debug, Clone)]
pub struct NewSettings {
    pub user_id: i64,
    pub groq_api_key: Option<String>,
    pub default_model: String,
    pub max_tokens: i64,
    pub temperature: i64,
    pub theme: String,
}

impl NewSettings {
    pub const DEFAULT_MODEL: &'static str = "llama3-8b-8192";
    pub const DEFAULT_MAX_TOKENS: i64 = 4096;
    pub const DEFAULT_TEMPERATURE: i64 = 70;
    pub const DEFAULT_THEME: &'static str = "light";

    pub fn defaults_for(user_id: i64) -> NewSettings {
        NewSettings {
            user_id,
            groq_api_key: None,
            default_model: Self::DEFAULT_MODEL.to_owned(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: Self::DEFAULT_TEMPERATURE,
            theme: Self::DEFAULT_THEME.to_owned(),
        }
    }
}

/// Fields of a conversation a user may change.
#[derive(Debug, Clone, Default)]
pub struct ConversationPatch {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ApiKeyPatch {
    pub name: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct WebhookPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    /// `Some(None)` clears the stored key.
    pub groq_api_key: Option<Option<String>>,
    pub default_model: Option<String>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<i64>,
    pub theme: Option<String>,
}

impl SettingsPatch {
    pub fn apply_to(self, settings: &mut NewSettings) {
        if let Some(key) = self.groq_api_key {
            settings.groq_api_key = key;
        }
        if let Some(model) = self.default_model {
            settings.default_model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
    }
}

impl From<&Settings> for NewSettings {
    fn from(settings: &Settings) -> Self {
        NewSettings {
            user_id: settings.user_id,
            groq_api_key: settings.groq_api_key.clone(),
            default_model: settings.default_model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            theme: settings.theme.clone(),
        }
    }
}
