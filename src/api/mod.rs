use crate::core::errors::ServiceError;
use crate::core::traits::AccountService;
use crate::infrastructure::entities;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use di_axum::Inject;
use serde_json::json;

pub mod achievements;
pub mod analytics;
pub mod api_keys;
pub mod auth;
pub mod conversations;
pub mod documents;
pub mod extractors;
pub mod messages;
pub mod public;
pub mod settings;
pub mod webhooks;

const USER_ID: &str = "user-id";

/// Every route of the service, under `/api`.
pub fn router() -> Router {
    Router::new().nest(
        "/api",
        Router::new()
            .merge(auth::router())
            .merge(achievements::router())
            .merge(public::router())
            .nest("/conversations", conversations::router())
            .nest("/messages", messages::router())
            .nest("/documents", documents::router())
            .nest("/api-keys", api_keys::router())
            .nest("/webhooks", webhooks::router())
            .nest("/analytics", analytics::router())
            .nest("/settings", settings::router()),
    )
}

/// The id claimed by the `user-id` header, not yet checked against the store.
#[derive(Debug)]
pub struct ExtractUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ServiceError> {
        let unauthorized = || ServiceError::Unauthorized("Unauthorized".to_owned());

        let user_id = parts.headers.get(USER_ID).ok_or_else(unauthorized)?;
        let user_id = user_id
            .to_str()
            .ok()
            .and_then(|id| id.trim().parse::<i64>().ok())
            .ok_or_else(unauthorized)?;
        Ok(ExtractUser(user_id))
    }
}

/// The authenticated caller.
#[derive(Debug)]
pub struct CurrentUser(pub entities::User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Response> {
        let ExtractUser(user_id) = ExtractUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let Inject(accounts) = Inject::<dyn AccountService>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        accounts
            .authenticate(user_id)
            .await
            .map(CurrentUser)
            .map_err(IntoResponse::into_response)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Validation(_) | ServiceError::MissingApiKey => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Upstream(_) | ServiceError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            ServiceError::Upstream(error) => json!({
                "message": "AI service error",
                "error": error,
            }),
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::MissingApiKey, StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Upstream("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Storage, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
