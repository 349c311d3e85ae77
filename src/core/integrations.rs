use crate::core::achievements;
use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::traits::{AchievementService, IntegrationService};
use crate::infrastructure::entities::{ApiKey, ApiKeyPatch, Webhook, WebhookPatch};
use crate::infrastructure::traits::IntegrationRepository;
use async_trait::async_trait;
use di::{Ref, injectable};
use reqwest::Url;

/// Webhook targets must be absolute http(s) URLs.
pub fn validate_webhook_url(url: &str) -> ServiceResult<()> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ServiceError::Validation(format!("invalid webhook url: {url}"))),
    }
}

fn require(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn api_key_not_found() -> ServiceError {
    ServiceError::NotFound("API key not found".to_owned())
}

fn webhook_not_found() -> ServiceError {
    ServiceError::NotFound("Webhook not found".to_owned())
}

#[injectable(IntegrationService)]
pub struct DefaultIntegrationService {
    repo: Ref<dyn IntegrationRepository>,
    achievements: Ref<dyn AchievementService>,
}

impl DefaultIntegrationService {
    pub fn new(
        repo: Ref<dyn IntegrationRepository>,
        achievements: Ref<dyn AchievementService>,
    ) -> Self {
        Self { repo, achievements }
    }

    async fn owned_api_key(&self, user_id: i64, api_key_id: i64) -> ServiceResult<ApiKey> {
        self.repo
            .get_api_key(api_key_id)
            .await?
            .filter(|key| key.user_id == user_id)
            .ok_or_else(api_key_not_found)
    }

    async fn owned_webhook(&self, user_id: i64, webhook_id: i64) -> ServiceResult<Webhook> {
        self.repo
            .get_webhook(webhook_id)
            .await?
            .filter(|webhook| webhook.user_id == user_id)
            .ok_or_else(webhook_not_found)
    }
}

#[async_trait]
impl IntegrationService for DefaultIntegrationService {
    async fn list_api_keys(&self, user_id: i64) -> ServiceResult<Vec<ApiKey>> {
        Ok(self.repo.list_api_keys(user_id).await?)
    }

    async fn create_api_key(
        &self,
        user_id: i64,
        name: String,
        key: String,
        active: bool,
    ) -> ServiceResult<ApiKey> {
        require("name", &name)?;
        require("key", &key)?;

        let api_key = self.repo.create_api_key(user_id, name, key, active).await?;
        self.achievements
            .record(user_id, achievements::API_KEYS, 1)
            .await;
        Ok(api_key)
    }

    async fn update_api_key(
        &self,
        user_id: i64,
        api_key_id: i64,
        patch: ApiKeyPatch,
    ) -> ServiceResult<ApiKey> {
        if let Some(name) = &patch.name {
            require("name", name)?;
        }
        self.owned_api_key(user_id, api_key_id).await?;
        self.repo
            .update_api_key(api_key_id, patch)
            .await?
            .ok_or_else(api_key_not_found)
    }

    async fn delete_api_key(&self, user_id: i64, api_key_id: i64) -> ServiceResult<()> {
        self.owned_api_key(user_id, api_key_id).await?;
        self.repo.delete_api_key(api_key_id).await?;
        Ok(())
    }

    async fn list_webhooks(&self, user_id: i64) -> ServiceResult<Vec<Webhook>> {
        Ok(self.repo.list_webhooks(user_id).await?)
    }

    async fn create_webhook(
        &self,
        user_id: i64,
        name: String,
        url: String,
        active: bool,
    ) -> ServiceResult<Webhook> {
        require("name", &name)?;
        validate_webhook_url(&url)?;

        let webhook = self.repo.create_webhook(user_id, name, url, active).await?;
        self.achievements
            .record(user_id, achievements::WEBHOOKS, 1)
            .await;
        Ok(webhook)
    }

    async fn update_webhook(
        &self,
        user_id: i64,
        webhook_id: i64,
        patch: WebhookPatch,
    ) -> ServiceResult<Webhook> {
        if let Some(name) = &patch.name {
            require("name", name)?;
        }
        if let Some(url) = &patch.url {
            validate_webhook_url(url)?;
        }
        self.owned_webhook(user_id, webhook_id).await?;
        self.repo
            .update_webhook(webhook_id, patch)
            .await?
            .ok_or_else(webhook_not_found)
    }

    async fn delete_webhook(&self, user_id: i64, webhook_id: i64) -> ServiceResult<()> {
        self.owned_webhook(user_id, webhook_id).await?;
        self.repo.delete_webhook(webhook_id).await?;
        Ok(())
    }
}
