use crate::api::CurrentUser;
use crate::api::extractors::{ApiJson, ApiPath};
use crate::api::api_keys::schemas::{ApiKey, CreateApiKey, UpdateApiKey};
use crate::core::errors::ServiceError;
use crate::core::traits::IntegrationService;
use crate::infrastructure::entities::ApiKeyPatch;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_api_keys).post(create_api_key))
        .route("/:id", patch(update_api_key).delete(delete_api_key))
}

async fn list_api_keys(
    Inject(integrations): Inject<dyn IntegrationService>,
    CurrentUser(current_user): CurrentUser,
) -> Result<Json<Vec<ApiKey>>, ServiceError> {
    let keys = integrations.list_api_keys(current_user.id).await?;
    Ok(Json(keys.into_iter().map(ApiKey::from).collect()))
}

async fn create_api_key(
    Inject(integrations): Inject<dyn IntegrationService>,
    CurrentUser(current_user): CurrentUser,
    ApiJson(create): ApiJson<CreateApiKey>,
) -> Result<(StatusCode, Json<ApiKey>), ServiceError> {
    let key = integrations
        .create_api_key(
            current_user.id,
            create.name,
            create.key,
            create.active.unwrap_or(true),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(key.into())))
}

async fn update_api_key(
    Inject(integrations): Inject<dyn IntegrationService>,
    CurrentUser(current_user): CurrentUser,
    ApiPath(api_key_id): ApiPath<i64>,
    ApiJson(update): ApiJson<UpdateApiKey>,
) -> Result<Json<ApiKey>, ServiceError> {
    let key = integrations
        .update_api_key(
            current_user.id,
            api_key_id,
            ApiKeyPatch {
                name: update.name,
                active: update.active,
            },
        )
        .await?;
    Ok(Json(key.into()))
}

async fn delete_api_key(
    Inject(integrations): Inject<dyn IntegrationService>,
    CurrentUser(current_user): CurrentUser,
    ApiPath(api_key_id): ApiPath<i64>,
) -> Result<StatusCode, ServiceError> {
    integrations
        .delete_api_key(current_user.id, api_key_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct CreateApiKey {
        pub name: String,
        pub key: String,
        pub active: Option<bool>,
    }

    #[derive(Deserialize, Debug)]
    pub struct UpdateApiKey {
        pub name: Option<String>,
        pub active: Option<bool>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct ApiKey {
        pub id: i64,
        pub name: String,
        pub key: String,
        pub user_id: i64,
        pub active: bool,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::ApiKey> for ApiKey {
        fn from(key: entities::ApiKey) -> Self {
            ApiKey {
                id: key.id,
                name: key.name,
                key: key.key_value,
                user_id: key.user_id,
                active: key.active,
                created_at: key.created_at,
            }
        }
    }
}
