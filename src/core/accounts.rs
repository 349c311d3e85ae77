use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::traits::{AccountService, CredentialVerifier};
use crate::infrastructure::entities::{NewUser, User};
use crate::infrastructure::traits::{IntegrationRepository, UserRepository};
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::info;

/// Compares against the password stored on the user row as-is.
pub struct StoredPasswordVerifier;

#[injectable(CredentialVerifier)]
impl StoredPasswordVerifier {
    #[inject]
    pub fn create() -> StoredPasswordVerifier {
        StoredPasswordVerifier
    }
}

impl CredentialVerifier for StoredPasswordVerifier {
    fn verify(&self, user: &User, password: &str) -> bool {
        user.password == password
    }
}

pub fn default_webhook_url(username: &str) -> String {
    format!("https://notifications.{username}.replit.app/webhook")
}

#[injectable(AccountService)]
pub struct DefaultAccountService {
    users: Ref<dyn UserRepository>,
    integrations: Ref<dyn IntegrationRepository>,
    verifier: Ref<dyn CredentialVerifier>,
}

impl DefaultAccountService {
    pub fn new(
        users: Ref<dyn UserRepository>,
        integrations: Ref<dyn IntegrationRepository>,
        verifier: Ref<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            users,
            integrations,
            verifier,
        }
    }
}

#[async_trait]
impl AccountService for DefaultAccountService {
    async fn register(&self, user: NewUser) -> ServiceResult<User> {
        for (field, value) in [
            ("username", &user.username),
            ("password", &user.password),
            ("email", &user.email),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::Validation(format!("{field} is required")));
            }
        }

        if self.users.get_user_by_username(&user.username).await?.is_some() {
            return Err(ServiceError::Validation(
                "Username already exists".to_owned(),
            ));
        }

        let user = self.users.create_user(user).await?;
        self.integrations
            .create_webhook(
                user.id,
                "Default Notifications".to_owned(),
                default_webhook_url(&user.username),
                false,
            )
            .await?;
        info!("registered user {} ({})", user.id, user.username);

        Ok(user)
    }

    async fn login(&self, username: &str, password: &str) -> ServiceResult<User> {
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "Username and password are required".to_owned(),
            ));
        }

        match self.users.get_user_by_username(username).await? {
            Some(user) if self.verifier.verify(&user, password) => Ok(user),
            _ => Err(ServiceError::Unauthorized("Invalid credentials".to_owned())),
        }
    }

    async fn authenticate(&self, user_id: i64) -> ServiceResult<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("User not found".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::DatabaseConnection;
    use crate::infrastructure::entities::UserRole;
    use crate::infrastructure::repositories::{DbIntegrationRepository, DbUserRepository};
    use std::sync::Arc;

    struct Fixture {
        service: DefaultAccountService,
        integrations: Arc<DbIntegrationRepository>,
    }

    async fn fixture() -> Fixture {
        let connection = Arc::new(DatabaseConnection::in_memory().await.unwrap());
        let integrations = Arc::new(DbIntegrationRepository::new(connection.clone()));
        let service = DefaultAccountService::new(
            Arc::new(DbUserRepository::new(connection)),
            integrations.clone(),
            Arc::new(StoredPasswordVerifier),
        );
        Fixture {
            service,
            integrations,
        }
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "hunter2".to_string(),
            email: format!("{username}@example.com"),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_register_creates_inactive_default_webhook() {
        let fixture = fixture().await;

        let user = fixture.service.register(new_user("alice")).await.unwrap();

        let webhooks = fixture.integrations.list_webhooks(user.id).await.unwrap();
        assert_eq!(webhooks.len(), 1);
        assert_eq!(webhooks[0].name, "Default Notifications");
        assert_eq!(
            webhooks[0].url,
            "https://notifications.alice.replit.app/webhook"
        );
        assert!(!webhooks[0].active);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username() {
        let fixture = fixture().await;
        fixture.service.register(new_user("bob")).await.unwrap();

        let err = fixture.service.register(new_user("bob")).await.unwrap_err();

        assert_eq!(
            err,
            ServiceError::Validation("Username already exists".to_string())
        );
    }

    #[tokio::test]
    async fn test_login_with_seeded_admin() {
        let fixture = fixture().await;

        let admin = fixture.service.login("admin", "admin123").await.unwrap();
        assert_eq!(admin.id, 1);
        assert_eq!(admin.role, UserRole::Admin);

        assert!(matches!(
            fixture.service.login("admin", "wrong").await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let fixture = fixture().await;

        assert_eq!(
            fixture.service.authenticate(42).await.unwrap_err(),
            ServiceError::Unauthorized("User not found".to_string())
        );
    }
}
