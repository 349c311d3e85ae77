//! The unauthenticated surface. Everything here runs as the seeded
//! administrator and uses the administrator's API key.

use crate::config::AppConfig;
use crate::core::assistant::{ChatMessage, CompletionRequest, TokenUsage, usage_cost_cents};
use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::integrations::validate_webhook_url;
use crate::core::notifier::{DeliveryReport, WebhookPayload};
use crate::core::traits::{AnalyticsService, NotificationService, PublicChatService};
use crate::infrastructure::entities::{ADMIN_USER_ID, NewSettings, Webhook};
use crate::infrastructure::traits::{CompletionClient, IntegrationRepository};
use async_trait::async_trait;
use di::{Ref, injectable};
use log::{error, warn};

pub const DEFAULT_WEBHOOK_NAME: &str = "Public Webhook";

#[injectable(PublicChatService)]
pub struct DefaultPublicChatService {
    completions: Ref<dyn CompletionClient>,
    analytics: Ref<dyn AnalyticsService>,
    notifier: Ref<dyn NotificationService>,
    integrations: Ref<dyn IntegrationRepository>,
    config: Ref<AppConfig>,
}

impl DefaultPublicChatService {
    pub fn new(
        completions: Ref<dyn CompletionClient>,
        analytics: Ref<dyn AnalyticsService>,
        notifier: Ref<dyn NotificationService>,
        integrations: Ref<dyn IntegrationRepository>,
        config: Ref<AppConfig>,
    ) -> Self {
        Self {
            completions,
            analytics,
            notifier,
            integrations,
            config,
        }
    }
}

#[async_trait]
impl PublicChatService for DefaultPublicChatService {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<String>,
    ) -> ServiceResult<(String, TokenUsage)> {
        if messages.is_empty() {
            return Err(ServiceError::Validation("messages are required".to_owned()));
        }

        let api_key = self
            .config
            .admin_api_key
            .clone()
            .or_else(|| self.config.default_api_key.clone())
            .ok_or(ServiceError::MissingApiKey)?;

        let request = CompletionRequest {
            model: model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| NewSettings::DEFAULT_MODEL.to_owned()),
            messages,
            max_tokens: NewSettings::DEFAULT_MAX_TOKENS,
            temperature: NewSettings::DEFAULT_TEMPERATURE as f32 / 100.0,
        };

        let completion = self
            .completions
            .complete(&api_key, &request)
            .await
            .map_err(|e| {
                error!("public chat completion failed: {e}");
                ServiceError::Upstream(e.client_message())
            })?;

        let total_tokens = completion.usage.total_tokens;
        if let Err(e) = self
            .analytics
            .record_usage(ADMIN_USER_ID, total_tokens, usage_cost_cents(total_tokens))
            .await
        {
            warn!("failed to record public chat usage: {e}");
        }

        Ok((completion.content, completion.usage))
    }

    async fn register_webhook(&self, name: Option<String>, url: String) -> ServiceResult<Webhook> {
        validate_webhook_url(&url)?;
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_NAME.to_owned());

        Ok(self
            .integrations
            .create_webhook(ADMIN_USER_ID, name, url, true)
            .await?)
    }

    async fn broadcast(&self, message: String, conversation_id: Option<i64>) -> DeliveryReport {
        self.notifier
            .notify(ADMIN_USER_ID, &WebhookPayload::new(message, conversation_id))
            .await
    }
}
