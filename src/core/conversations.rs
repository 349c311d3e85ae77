//! Conversations and the chat completion pipeline.
//!
//! Sending a message stores the user's turn first, then builds the prompt
//! from recent history and any referenced documents, calls the completion
//! endpoint and stores the reply. Usage analytics, webhook notifications and
//! the `messages` achievement follow as side effects that never fail the
//! request.

use crate::config::AppConfig;
use crate::core::achievements;
use crate::core::assistant::{
    ChatMessage, CompletionRequest, augment_prompt, estimate_tokens, history_window,
    usage_cost_cents,
};
use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::notifier::WebhookPayload;
use crate::core::traits::{
    AchievementService, AnalyticsService, ConversationService, DocumentService,
    NotificationService, SettingsService,
};
use crate::infrastructure::entities::{
    Conversation, ConversationPatch, Message, MessageRole, NewMessage,
};
use crate::infrastructure::traits::{CompletionClient, ConversationRepository};
use async_trait::async_trait;
use di::{Ref, injectable};
use log::{debug, error, warn};

/// Both sides of one completed turn.
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub user_message: Message,
    pub ai_message: Message,
}

fn conversation_not_found() -> ServiceError {
    ServiceError::NotFound("Conversation not found".to_owned())
}

fn validate_title(title: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("title is required".to_owned()));
    }
    Ok(())
}

#[injectable(ConversationService)]
pub struct DefaultConversationService {
    repo: Ref<dyn ConversationRepository>,
    documents: Ref<dyn DocumentService>,
    settings: Ref<dyn SettingsService>,
    completions: Ref<dyn CompletionClient>,
    analytics: Ref<dyn AnalyticsService>,
    notifier: Ref<dyn NotificationService>,
    achievements: Ref<dyn AchievementService>,
    config: Ref<AppConfig>,
}

impl DefaultConversationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Ref<dyn ConversationRepository>,
        documents: Ref<dyn DocumentService>,
        settings: Ref<dyn SettingsService>,
        completions: Ref<dyn CompletionClient>,
        analytics: Ref<dyn AnalyticsService>,
        notifier: Ref<dyn NotificationService>,
        achievements: Ref<dyn AchievementService>,
        config: Ref<AppConfig>,
    ) -> Self {
        Self {
            repo,
            documents,
            settings,
            completions,
            analytics,
            notifier,
            achievements,
            config,
        }
    }

    async fn owned_conversation(
        &self,
        user_id: i64,
        conversation_id: i64,
    ) -> ServiceResult<Conversation> {
        self.repo
            .get_conversation(conversation_id)
            .await?
            .filter(|conversation| conversation.user_id == user_id)
            .ok_or_else(conversation_not_found)
    }
}

#[async_trait]
impl ConversationService for DefaultConversationService {
    async fn list_conversations(&self, user_id: i64) -> ServiceResult<Vec<Conversation>> {
        Ok(self.repo.list_conversations(user_id).await?)
    }

    async fn create_conversation(&self, user_id: i64, title: String) -> ServiceResult<Conversation> {
        validate_title(&title)?;

        let conversation = self.repo.create_conversation(user_id, title).await?;
        self.achievements
            .record(user_id, achievements::CONVERSATIONS, 1)
            .await;

        Ok(conversation)
    }

    async fn get_conversation(
        &self,
        user_id: i64,
        conversation_id: i64,
    ) -> ServiceResult<(Conversation, Vec<Message>)> {
        let conversation = self.owned_conversation(user_id, conversation_id).await?;
        let messages = self.repo.list_conversation_messages(conversation_id).await?;
        Ok((conversation, messages))
    }

    async fn rename_conversation(
        &self,
        user_id: i64,
        conversation_id: i64,
        patch: ConversationPatch,
    ) -> ServiceResult<Conversation> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        self.owned_conversation(user_id, conversation_id).await?;
        self.repo
            .update_conversation(conversation_id, patch)
            .await?
            .ok_or_else(conversation_not_found)
    }

    async fn delete_conversation(&self, user_id: i64, conversation_id: i64) -> ServiceResult<()> {
        self.owned_conversation(user_id, conversation_id).await?;
        self.repo.delete_conversation(conversation_id).await?;
        Ok(())
    }

    async fn send_message(
        &self,
        user_id: i64,
        conversation_id: i64,
        content: String,
        document_ids: Vec<i64>,
    ) -> ServiceResult<ChatExchange> {
        if content.trim().is_empty() {
            return Err(ServiceError::Validation("content is required".to_owned()));
        }
        self.owned_conversation(user_id, conversation_id).await?;

        let user_message = self
            .repo
            .create_message(NewMessage {
                conversation_id,
                content: content.clone(),
                role: MessageRole::User,
                document_reference: None,
                token_count: Some(estimate_tokens(&content)),
            })
            .await?;

        // From here on the user's message stays stored whatever happens.
        let settings = self.settings.get_settings(user_id).await?;

        let context = if document_ids.is_empty() {
            String::new()
        } else {
            self.documents
                .assemble_context(user_id, &document_ids)
                .await?
        };

        let earlier: Vec<Message> = self
            .repo
            .list_conversation_messages(conversation_id)
            .await?
            .into_iter()
            .filter(|message| message.id != user_message.id)
            .collect();
        let mut messages = history_window(earlier);
        messages.push(ChatMessage::user(augment_prompt(&content, &context)));

        let api_key = settings
            .groq_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.config.default_api_key.clone())
            .ok_or(ServiceError::MissingApiKey)?;

        let request = CompletionRequest::from_settings(&settings, messages);
        let completion = self
            .completions
            .complete(&api_key, &request)
            .await
            .map_err(|e| {
                error!("Groq API error: {e}");
                ServiceError::Upstream(e.client_message())
            })?;

        let document_reference = (!document_ids.is_empty()).then(|| {
            document_ids
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        });

        let ai_message = self
            .repo
            .create_message(NewMessage {
                conversation_id,
                content: completion.content.clone(),
                role: MessageRole::Assistant,
                document_reference,
                token_count: Some(completion.usage.completion_tokens),
            })
            .await?;

        let total_tokens = completion.usage.total_tokens;
        if let Err(e) = self
            .analytics
            .record_usage(user_id, total_tokens, usage_cost_cents(total_tokens))
            .await
        {
            warn!("failed to record usage for user {user_id}: {e}");
        }

        let report = self
            .notifier
            .notify(
                user_id,
                &WebhookPayload::new(completion.content, Some(conversation_id)),
            )
            .await;
        debug!(
            "conversation {conversation_id}: {}/{} webhooks delivered",
            report.delivered, report.attempted
        );

        self.achievements
            .record(user_id, achievements::MESSAGES, 1)
            .await;

        if self.repo.touch_conversation(conversation_id).await.is_err() {
            warn!("failed to bump conversation {conversation_id}");
        }

        Ok(ChatExchange {
            user_message,
            ai_message,
        })
    }
}
