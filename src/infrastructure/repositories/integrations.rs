use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{ApiKey, ApiKeyPatch, Webhook, WebhookPatch};
use crate::infrastructure::traits::IntegrationRepository;
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::error;

#[injectable(IntegrationRepository)]
pub struct DbIntegrationRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbIntegrationRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl IntegrationRepository for DbIntegrationRepository {
    async fn get_api_key(&self, api_key_id: i64) -> Result<Option<ApiKey>, ()> {
        sqlx::query_as("SELECT * FROM api_keys WHERE id = ?")
            .bind(api_key_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn list_api_keys(&self, user_id: i64) -> Result<Vec<ApiKey>, ()> {
        sqlx::query_as("SELECT * FROM api_keys WHERE user_id = ? ORDER BY id ASC")
            .bind(user_id)
            .fetch_all(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn create_api_key(
        &self,
        user_id: i64,
        name: String,
        key: String,
        active: bool,
    ) -> Result<ApiKey, ()> {
        sqlx::query_as(
            "INSERT INTO api_keys (name, key_value, user_id, active, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(name)
        .bind(key)
        .bind(user_id)
        .bind(active)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn update_api_key(&self, api_key_id: i64, patch: ApiKeyPatch) -> Result<Option<ApiKey>, ()> {
        sqlx::query_as(
            "UPDATE api_keys SET name = COALESCE(?, name), active = COALESCE(?, active) WHERE id = ? RETURNING *",
        )
        .bind(patch.name)
        .bind(patch.active)
        .bind(api_key_id)
        .fetch_optional(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn delete_api_key(&self, api_key_id: i64) -> Result<bool, ()> {
        sqlx::query("DELETE FROM api_keys WHERE id = ?")
            .bind(api_key_id)
            .execute(&**self.connection)
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| error!("{e}"))
    }

    async fn get_webhook(&self, webhook_id: i64) -> Result<Option<Webhook>, ()> {
        sqlx::query_as("SELECT * FROM webhooks WHERE id = ?")
            .bind(webhook_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn list_webhooks(&self, user_id: i64) -> Result<Vec<Webhook>, ()> {
        sqlx::query_as("SELECT * FROM webhooks WHERE user_id = ? ORDER BY id ASC")
            .bind(user_id)
            .fetch_all(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn create_webhook(
        &self,
        user_id: i64,
        name: String,
        url: String,
        active: bool,
    ) -> Result<Webhook, ()> {
        sqlx::query_as(
            "INSERT INTO webhooks (name, url, user_id, active, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(active)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn update_webhook(
        &self,
        webhook_id: i64,
        patch: WebhookPatch,
    ) -> Result<Option<Webhook>, ()> {
        sqlx::query_as(
            "UPDATE webhooks SET name = COALESCE(?, name), url = COALESCE(?, url), active = COALESCE(?, active) WHERE id = ? RETURNING *",
        )
        .bind(patch.name)
        .bind(patch.url)
        .bind(patch.active)
        .bind(webhook_id)
        .fetch_optional(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn delete_webhook(&self, webhook_id: i64) -> Result<bool, ()> {
        sqlx::query("DELETE FROM webhooks WHERE id = ?")
            .bind(webhook_id)
            .execute(&**self.connection)
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| error!("{e}"))
    }
}
