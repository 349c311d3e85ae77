use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{NewSettings, NewUser, Settings, User};
use crate::infrastructure::traits::{SettingsRepository, UserRepository};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::error;

#[injectable(UserRepository)]
pub struct DbUserRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbUserRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl UserRepository for DbUserRepository {
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, ()> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ()> {
        sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, ()> {
        sqlx::query_as(
            "INSERT INTO users (username, password, email, role, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(user.username)
        .bind(user.password)
        .bind(user.email)
        .bind(user.role)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }
}

#[injectable(SettingsRepository)]
pub struct DbSettingsRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbSettingsRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl SettingsRepository for DbSettingsRepository {
    async fn get_settings(&self, user_id: i64) -> Result<Option<Settings>, ()> {
        sqlx::query_as("SELECT * FROM settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn create_settings(&self, settings: NewSettings) -> Result<Option<Settings>, ()> {
        sqlx::query_as(
            "INSERT INTO settings (user_id, groq_api_key, default_model, max_tokens, temperature, theme, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?) ON CONFLICT (user_id) DO NOTHING RETURNING *",
        )
        .bind(settings.user_id)
        .bind(settings.groq_api_key)
        .bind(settings.default_model)
        .bind(settings.max_tokens)
        .bind(settings.temperature)
        .bind(settings.theme)
        .bind(Utc::now())
        .fetch_optional(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn replace_settings(&self, settings: NewSettings) -> Result<Option<Settings>, ()> {
        sqlx::query_as(
            "UPDATE settings SET groq_api_key = ?, default_model = ?, max_tokens = ?, temperature = ?, theme = ?, updated_at = ? WHERE user_id = ? RETURNING *",
        )
        .bind(settings.groq_api_key)
        .bind(settings.default_model)
        .bind(settings.max_tokens)
        .bind(settings.temperature)
        .bind(settings.theme)
        .bind(Utc::now())
        .bind(settings.user_id)
        .fetch_optional(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }
}
