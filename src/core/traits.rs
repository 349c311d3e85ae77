//! DI "Interfaces"

use crate::core::achievements::AchievementProgress;
use crate::core::analytics::UsageReport;
use crate::core::assistant::{ChatMessage, TokenUsage};
use crate::core::conversations::ChatExchange;
use crate::core::documents::Upload;
use crate::core::errors::ServiceResult;
use crate::core::notifier::{DeliveryReport, WebhookPayload};
use crate::infrastructure::entities;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait AccountService: Send + Sync {
    /// Creates the user together with their (inactive) default webhook.
    ///
    /// Returns `Validation` if the username is taken.
    async fn register(&self, user: entities::NewUser) -> ServiceResult<entities::User>;

    async fn login(&self, username: &str, password: &str) -> ServiceResult<entities::User>;

    /// Resolves the caller of an authenticated request.
    async fn authenticate(&self, user_id: i64) -> ServiceResult<entities::User>;
}

/// Decides whether a password matches a stored user.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, user: &entities::User, password: &str) -> bool;
}

#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Lists all conversations for the given user, most recently updated first.
    async fn list_conversations(&self, user_id: i64) -> ServiceResult<Vec<entities::Conversation>>;

    /// Creates a new conversation for the given user.
    async fn create_conversation(
        &self,
        user_id: i64,
        title: String,
    ) -> ServiceResult<entities::Conversation>;

    /// A conversation with its messages, oldest first.
    ///
    /// Returns `NotFound` if the conversation does not exist or belongs to someone else.
    async fn get_conversation(
        &self,
        user_id: i64,
        conversation_id: i64,
    ) -> ServiceResult<(entities::Conversation, Vec<entities::Message>)>;

    async fn rename_conversation(
        &self,
        user_id: i64,
        conversation_id: i64,
        patch: entities::ConversationPatch,
    ) -> ServiceResult<entities::Conversation>;

    /// Deletes a given conversation from the given user. Its messages stay stored.
    async fn delete_conversation(&self, user_id: i64, conversation_id: i64) -> ServiceResult<()>;

    /// Stores the user's message, asks the model for a reply and stores that too.
    ///
    /// The user message is kept even if the completion call fails.
    async fn send_message(
        &self,
        user_id: i64,
        conversation_id: i64,
        content: String,
        document_ids: Vec<i64>,
    ) -> ServiceResult<ChatExchange>;
}

#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn list_documents(&self, user_id: i64) -> ServiceResult<Vec<entities::Document>>;

    async fn upload_document(&self, user_id: i64, upload: Upload)
    -> ServiceResult<entities::Document>;

    async fn delete_document(&self, user_id: i64, document_id: i64) -> ServiceResult<()>;

    /// Text of the given documents in request order. Ids that are missing or
    /// owned by someone else are skipped.
    async fn assemble_context(&self, user_id: i64, document_ids: &[i64]) -> ServiceResult<String>;
}

#[async_trait]
pub trait IntegrationService: Send + Sync {
    async fn list_api_keys(&self, user_id: i64) -> ServiceResult<Vec<entities::ApiKey>>;

    async fn create_api_key(
        &self,
        user_id: i64,
        name: String,
        key: String,
        active: bool,
    ) -> ServiceResult<entities::ApiKey>;

    async fn update_api_key(
        &self,
        user_id: i64,
        api_key_id: i64,
        patch: entities::ApiKeyPatch,
    ) -> ServiceResult<entities::ApiKey>;

    async fn delete_api_key(&self, user_id: i64, api_key_id: i64) -> ServiceResult<()>;

    async fn list_webhooks(&self, user_id: i64) -> ServiceResult<Vec<entities::Webhook>>;

    async fn create_webhook(
        &self,
        user_id: i64,
        name: String,
        url: String,
        active: bool,
    ) -> ServiceResult<entities::Webhook>;

    async fn update_webhook(
        &self,
        user_id: i64,
        webhook_id: i64,
        patch: entities::WebhookPatch,
    ) -> ServiceResult<entities::Webhook>;

    async fn delete_webhook(&self, user_id: i64, webhook_id: i64) -> ServiceResult<()>;
}

#[async_trait]
pub trait AchievementService: Send + Sync {
    /// Adds `amount` to the user's counter and grants every badge it now qualifies for.
    async fn increment(
        &self,
        user_id: i64,
        kind: &str,
        amount: i64,
    ) -> ServiceResult<AchievementProgress>;

    /// Like `increment`, for side effects of other operations: failures are
    /// logged and dropped.
    async fn record(&self, user_id: i64, kind: &str, amount: i64);

    async fn list_badges(&self) -> ServiceResult<Vec<entities::Badge>>;

    async fn list_user_badges(&self, user_id: i64) -> ServiceResult<Vec<entities::UserBadge>>;

    async fn list_achievements(&self, user_id: i64)
    -> ServiceResult<Vec<entities::UserAchievement>>;
}

#[async_trait]
pub trait AnalyticsService: Send + Sync {
    async fn record_usage(
        &self,
        user_id: i64,
        tokens_used: i64,
        cost_cents: i64,
    ) -> ServiceResult<entities::Analytics>;

    /// Rows with `start <= date <= end`; start defaults to the epoch and end to now.
    async fn summarize(
        &self,
        user_id: i64,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ServiceResult<UsageReport>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Posts the payload to every active webhook of the user. Never fails.
    async fn notify(&self, user_id: i64, payload: &WebhookPayload) -> DeliveryReport;
}

#[async_trait]
pub trait SettingsService: Send + Sync {
    /// The user's settings, created with defaults on first access.
    async fn get_settings(&self, user_id: i64) -> ServiceResult<entities::Settings>;

    /// Returns the updated settings and whether the row had to be created.
    async fn update_settings(
        &self,
        user_id: i64,
        patch: entities::SettingsPatch,
    ) -> ServiceResult<(entities::Settings, bool)>;
}

#[async_trait]
pub trait PublicChatService: Send + Sync {
    /// One-shot completion on behalf of the administrator.
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<String>,
    ) -> ServiceResult<(String, TokenUsage)>;

    async fn register_webhook(
        &self,
        name: Option<String>,
        url: String,
    ) -> ServiceResult<entities::Webhook>;

    async fn broadcast(&self, message: String, conversation_id: Option<i64>) -> DeliveryReport;
}
