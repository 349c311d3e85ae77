//! Unauthenticated endpoints used by the public chat page.

use crate::api::extractors::ApiJson;
use crate::api::public::schemas::{ChatReply, ChatRequest, NotifyRequest, RegisterWebhook};
use crate::api::webhooks::schemas::Webhook;
use crate::core::errors::ServiceError;
use crate::core::notifier::DeliveryReport;
use crate::core::traits::PublicChatService;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/public/webhook", post(register_webhook))
        .route("/public/webhook/notify", post(notify))
}

async fn chat(
    Inject(public_chat): Inject<dyn PublicChatService>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatReply>, ServiceError> {
    let (reply, usage) = public_chat.chat(request.messages, request.model).await?;
    Ok(Json(ChatReply { reply, usage }))
}

async fn register_webhook(
    Inject(public_chat): Inject<dyn PublicChatService>,
    ApiJson(request): ApiJson<RegisterWebhook>,
) -> Result<(StatusCode, Json<Webhook>), ServiceError> {
    let webhook = public_chat
        .register_webhook(request.name, request.url)
        .await?;
    Ok((StatusCode::CREATED, Json(webhook.into())))
}

async fn notify(
    Inject(public_chat): Inject<dyn PublicChatService>,
    ApiJson(request): ApiJson<NotifyRequest>,
) -> Json<DeliveryReport> {
    Json(
        public_chat
            .broadcast(request.message, request.conversation_id)
            .await,
    )
}

pub mod schemas {
    use crate::core::assistant::{ChatMessage, TokenUsage};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct ChatRequest {
        pub messages: Vec<ChatMessage>,
        pub model: Option<String>,
    }

    #[derive(Serialize, Debug)]
    pub struct ChatReply {
        pub reply: String,
        pub usage: TokenUsage,
    }

    #[derive(Deserialize, Debug)]
    pub struct RegisterWebhook {
        pub name: Option<String>,
        pub url: String,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct NotifyRequest {
        pub message: String,
        pub conversation_id: Option<i64>,
    }
}
