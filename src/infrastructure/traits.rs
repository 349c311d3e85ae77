//! Infrastructure traits, used for DI on higher levels
//!
//! Repository methods log the underlying database error and return `Err(())`;
//! callers decide how loudly to fail.

use crate::core::assistant::{Completion, CompletionRequest};
use crate::infrastructure::entities;
use async_trait::async_trait;
use thiserror::Error;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, user_id: i64) -> Result<Option<entities::User>, ()>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<entities::User>, ()>;

    async fn create_user(&self, user: entities::NewUser) -> Result<entities::User, ()>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn list_conversations(&self, user_id: i64) -> Result<Vec<entities::Conversation>, ()>;

    async fn get_conversation(
        &self,
        conversation_id: i64,
    ) -> Result<Option<entities::Conversation>, ()>;

    async fn create_conversation(
        &self,
        user_id: i64,
        title: String,
    ) -> Result<entities::Conversation, ()>;

    async fn update_conversation(
        &self,
        conversation_id: i64,
        patch: entities::ConversationPatch,
    ) -> Result<Option<entities::Conversation>, ()>;

    /// Bumps `updated_at` without changing anything else.
    async fn touch_conversation(&self, conversation_id: i64) -> Result<(), ()>;

    /// Messages are left in place.
    async fn delete_conversation(&self, conversation_id: i64) -> Result<bool, ()>;

    /// Oldest first.
    async fn list_conversation_messages(
        &self,
        conversation_id: i64,
    ) -> Result<Vec<entities::Message>, ()>;

    async fn create_message(&self, message: entities::NewMessage)
    -> Result<entities::Message, ()>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn get_document(&self, document_id: i64) -> Result<Option<entities::Document>, ()>;

    async fn list_documents(&self, user_id: i64) -> Result<Vec<entities::Document>, ()>;

    async fn create_document(
        &self,
        document: entities::NewDocument,
    ) -> Result<entities::Document, ()>;

    async fn delete_document(&self, document_id: i64) -> Result<bool, ()>;
}

#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    async fn get_api_key(&self, api_key_id: i64) -> Result<Option<entities::ApiKey>, ()>;

    async fn list_api_keys(&self, user_id: i64) -> Result<Vec<entities::ApiKey>, ()>;

    async fn create_api_key(
        &self,
        user_id: i64,
        name: String,
        key: String,
        active: bool,
    ) -> Result<entities::ApiKey, ()>;

    async fn update_api_key(
        &self,
        api_key_id: i64,
        patch: entities::ApiKeyPatch,
    ) -> Result<Option<entities::ApiKey>, ()>;

    async fn delete_api_key(&self, api_key_id: i64) -> Result<bool, ()>;

    async fn get_webhook(&self, webhook_id: i64) -> Result<Option<entities::Webhook>, ()>;

    async fn list_webhooks(&self, user_id: i64) -> Result<Vec<entities::Webhook>, ()>;

    async fn create_webhook(
        &self,
        user_id: i64,
        name: String,
        url: String,
        active: bool,
    ) -> Result<entities::Webhook, ()>;

    async fn update_webhook(
        &self,
        webhook_id: i64,
        patch: entities::WebhookPatch,
    ) -> Result<Option<entities::Webhook>, ()>;

    async fn delete_webhook(&self, webhook_id: i64) -> Result<bool, ()>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn create_analytics(
        &self,
        user_id: i64,
        tokens_used: i64,
        cost_cents: i64,
    ) -> Result<entities::Analytics, ()>;

    async fn list_analytics(&self, user_id: i64) -> Result<Vec<entities::Analytics>, ()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_settings(&self, user_id: i64) -> Result<Option<entities::Settings>, ()>;

    /// Inserts the row unless the user already has one, in which case
    /// nothing is written and `None` is returned.
    async fn create_settings(
        &self,
        settings: entities::NewSettings,
    ) -> Result<Option<entities::Settings>, ()>;

    /// Overwrites every updatable field of the user's row.
    async fn replace_settings(
        &self,
        settings: entities::NewSettings,
    ) -> Result<Option<entities::Settings>, ()>;
}

#[async_trait]
pub trait AchievementRepository: Send + Sync {
    async fn list_badges(&self) -> Result<Vec<entities::Badge>, ()>;

    /// Badges for `criteria` whose threshold is at most `count`.
    async fn qualifying_badges(
        &self,
        criteria: &str,
        count: i64,
    ) -> Result<Vec<entities::Badge>, ()>;

    async fn list_user_badges(&self, user_id: i64) -> Result<Vec<entities::UserBadge>, ()>;

    /// Returns `None` when the user already holds the badge.
    async fn grant_badge(
        &self,
        user_id: i64,
        badge_id: i64,
    ) -> Result<Option<entities::UserBadge>, ()>;

    async fn list_achievements(&self, user_id: i64) -> Result<Vec<entities::UserAchievement>, ()>;

    /// Creates the (user, kind) counter at `amount` or adds `amount` to it.
    async fn increment_achievement(
        &self,
        user_id: i64,
        kind: &str,
        amount: i64,
    ) -> Result<entities::UserAchievement, ()>;
}

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The endpoint answered with an error; carries its message when it sent one.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion response contained no choices")]
    EmptyResponse,
}

impl CompletionError {
    /// What a client gets to see of the failure. Only messages sent by the
    /// endpoint itself are passed through.
    pub fn client_message(&self) -> String {
        match self {
            CompletionError::Upstream { message, .. } => message.clone(),
            _ => "Unknown error".to_owned(),
        }
    }
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<Completion, CompletionError>;
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook responded with status {0}")]
    Status(u16),

    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError>;
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unreadable document: {0}")]
    Unreadable(String),
}

/// Pulls plain text out of an uploaded file.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}
