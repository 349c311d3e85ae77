use crate::api::CurrentUser;
use crate::api::extractors::{ApiJson, ApiPath};
use crate::api::webhooks::schemas::{CreateWebhook, UpdateWebhook, Webhook};
use crate::core::errors::ServiceError;
use crate::core::traits::IntegrationService;
use crate::infrastructure::entities::WebhookPatch;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_webhooks).post(create_webhook))
        .route("/:id", patch(update_webhook).delete(delete_webhook))
}

async fn list_webhooks(
    Inject(integrations): Inject<dyn IntegrationService>,
    CurrentUser(current_user): CurrentUser,
) -> Result<Json<Vec<Webhook>>, ServiceError> {
    let webhooks = integrations.list_webhooks(current_user.id).await?;
    Ok(Json(webhooks.into_iter().map(Webhook::from).collect()))
}

async fn create_webhook(
    Inject(integrations): Inject<dyn IntegrationService>,
    CurrentUser(current_user): CurrentUser,
    ApiJson(create): ApiJson<CreateWebhook>,
) -> Result<(StatusCode, Json<Webhook>), ServiceError> {
    let webhook = integrations
        .create_webhook(
            current_user.id,
            create.name,
            create.url,
            create.active.unwrap_or(true),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(webhook.into())))
}

async fn update_webhook(
    Inject(integrations): Inject<dyn IntegrationService>,
    CurrentUser(current_user): CurrentUser,
    ApiPath(webhook_id): ApiPath<i64>,
    ApiJson(update): ApiJson<UpdateWebhook>,
) -> Result<Json<Webhook>, ServiceError> {
    let webhook = integrations
        .update_webhook(
            current_user.id,
            webhook_id,
            WebhookPatch {
                name: update.name,
                url: update.url,
                active: update.active,
            },
        )
        .await?;
    Ok(Json(webhook.into()))
}

async fn delete_webhook(
    Inject(integrations): Inject<dyn IntegrationService>,
    CurrentUser(current_user): CurrentUser,
    ApiPath(webhook_id): ApiPath<i64>,
) -> Result<StatusCode, ServiceError> {
    integrations
        .delete_webhook(current_user.id, webhook_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct CreateWebhook {
        pub name: String,
        pub url: String,
        pub active: Option<bool>,
    }

    #[derive(Deserialize, Debug)]
    pub struct UpdateWebhook {
        pub name: Option<String>,
        pub url: Option<String>,
        pub active: Option<bool>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Webhook {
        pub id: i64,
        pub name: String,
        pub url: String,
        pub user_id: i64,
        pub active: bool,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::Webhook> for Webhook {
        fn from(webhook: entities::Webhook) -> Self {
            Webhook {
                id: webhook.id,
                name: webhook.name,
                url: webhook.url,
                user_id: webhook.user_id,
                active: webhook.active,
                created_at: webhook.created_at,
            }
        }
    }
}
