use crate::api::CurrentUser;
use crate::api::extractors::ApiJson;
use crate::api::settings::schemas::{Settings, UpdateSettings};
use crate::core::errors::ServiceError;
use crate::core::traits::SettingsService;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new().route("/", get(get_settings).patch(update_settings))
}

async fn get_settings(
    Inject(settings_service): Inject<dyn SettingsService>,
    CurrentUser(current_user): CurrentUser,
) -> Result<Json<Settings>, ServiceError> {
    let settings = settings_service.get_settings(current_user.id).await?;
    Ok(Json(settings.into()))
}

async fn update_settings(
    Inject(settings_service): Inject<dyn SettingsService>,
    CurrentUser(current_user): CurrentUser,
    ApiJson(update): ApiJson<UpdateSettings>,
) -> Result<(StatusCode, Json<Settings>), ServiceError> {
    let (settings, created) = settings_service
        .update_settings(current_user.id, update.into())
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(settings.into())))
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize};

    /// Keeps an explicit `null` apart from a missing field.
    fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateSettings {
        #[serde(default, deserialize_with = "explicit_null")]
        pub groq_api_key: Option<Option<String>>,
        pub default_model: Option<String>,
        pub max_tokens: Option<i64>,
        pub temperature: Option<i64>,
        pub theme: Option<String>,
    }

    impl From<UpdateSettings> for entities::SettingsPatch {
        fn from(update: UpdateSettings) -> Self {
            entities::SettingsPatch {
                groq_api_key: update.groq_api_key,
                default_model: update.default_model,
                max_tokens: update.max_tokens,
                temperature: update.temperature,
                theme: update.theme,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Settings {
        pub id: i64,
        pub user_id: i64,
        pub groq_api_key: Option<String>,
        pub default_model: String,
        pub max_tokens: i64,
        pub temperature: i64,
        pub theme: String,
        pub updated_at: DateTime<Utc>,
    }

    impl From<entities::Settings> for Settings {
        fn from(settings: entities::Settings) -> Self {
            Settings {
                id: settings.id,
                user_id: settings.user_id,
                groq_api_key: settings.groq_api_key,
                default_model: settings.default_model,
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
                theme: settings.theme,
                updated_at: settings.updated_at,
            }
        }
    }

}
