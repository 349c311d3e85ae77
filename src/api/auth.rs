//! Registration and login

use crate::api::extractors::ApiJson;
use crate::api::auth::schemas::{Login, Register, User};
use crate::core::errors::ServiceError;
use crate::core::traits::AccountService;
use crate::infrastructure::entities;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

async fn register(
    Inject(accounts): Inject<dyn AccountService>,
    ApiJson(register): ApiJson<Register>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let user = accounts
        .register(entities::NewUser {
            username: register.username,
            password: register.password,
            email: register.email,
            role: register.role.unwrap_or_default().into(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn login(
    Inject(accounts): Inject<dyn AccountService>,
    ApiJson(login): ApiJson<Login>,
) -> Result<Json<User>, ServiceError> {
    let user = accounts
        .login(
            login.username.as_deref().unwrap_or_default(),
            login.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(user.into()))
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        #[default]
        User,
        Admin,
    }

    impl From<Role> for entities::UserRole {
        fn from(role: Role) -> Self {
            match role {
                Role::User => entities::UserRole::User,
                Role::Admin => entities::UserRole::Admin,
            }
        }
    }

    impl From<entities::UserRole> for Role {
        fn from(role: entities::UserRole) -> Self {
            match role {
                entities::UserRole::User => Role::User,
                entities::UserRole::Admin => Role::Admin,
            }
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct Register {
        pub username: String,
        pub password: String,
        pub email: String,
        pub role: Option<Role>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Login {
        pub username: Option<String>,
        pub password: Option<String>,
    }

    /// A user as clients see it; the password never leaves the server.
    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct User {
        pub id: i64,
        pub username: String,
        pub email: String,
        pub role: Role,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::User> for User {
        fn from(user: entities::User) -> Self {
            User {
                id: user.id,
                username: user.username,
                email: user.email,
                role: user.role.into(),
                created_at: user.created_at,
            }
        }
    }
}
