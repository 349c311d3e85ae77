//! Sending chat messages

use crate::api::CurrentUser;
use crate::api::extractors::ApiJson;
use crate::api::messages::schemas::{Exchange, SendMessage};
use crate::core::errors::ServiceError;
use crate::core::traits::ConversationService;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new().route("/", post(send_message))
}

async fn send_message(
    Inject(conversation_service): Inject<dyn ConversationService>,
    CurrentUser(current_user): CurrentUser,
    ApiJson(message): ApiJson<SendMessage>,
) -> Result<Json<Exchange>, ServiceError> {
    let exchange = conversation_service
        .send_message(
            current_user.id,
            message.conversation_id,
            message.content,
            message.document_ids.unwrap_or_default(),
        )
        .await?;

    Ok(Json(Exchange {
        user_message: exchange.user_message.into(),
        ai_message: exchange.ai_message.into(),
    }))
}

pub mod schemas {
    use crate::api::conversations::schemas::Message;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct SendMessage {
        pub conversation_id: i64,
        pub content: String,
        pub document_ids: Option<Vec<i64>>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Exchange {
        pub user_message: Message,
        pub ai_message: Message,
    }
}
