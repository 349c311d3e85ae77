//! Conversations endpoints

use crate::api::CurrentUser;
use crate::api::extractors::{ApiJson, ApiPath};
use crate::api::conversations::schemas::{
    Conversation, ConversationWithMessages, CreateConversation, UpdateConversation,
};
use crate::core::errors::ServiceError;
use crate::core::traits::ConversationService;
use crate::infrastructure::entities::ConversationPatch;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_conversations).post(new_conversation))
        .route(
            "/:id",
            get(get_conversation)
                .patch(update_conversation)
                .delete(delete_conversation),
        )
}

async fn list_conversations(
    Inject(conversation_service): Inject<dyn ConversationService>,
    CurrentUser(current_user): CurrentUser,
) -> Result<Json<Vec<Conversation>>, ServiceError> {
    let conversations = conversation_service
        .list_conversations(current_user.id)
        .await?;

    Ok(Json(
        conversations.into_iter().map(Conversation::from).collect(),
    ))
}

async fn new_conversation(
    Inject(conversation_service): Inject<dyn ConversationService>,
    CurrentUser(current_user): CurrentUser,
    ApiJson(create_conversation): ApiJson<CreateConversation>,
) -> Result<(StatusCode, Json<Conversation>), ServiceError> {
    let conversation = conversation_service
        .create_conversation(current_user.id, create_conversation.title)
        .await?;

    Ok((StatusCode::CREATED, Json(conversation.into())))
}

async fn get_conversation(
    Inject(conversation_service): Inject<dyn ConversationService>,
    CurrentUser(current_user): CurrentUser,
    ApiPath(conversation_id): ApiPath<i64>,
) -> Result<Json<ConversationWithMessages>, ServiceError> {
    let (conversation, messages) = conversation_service
        .get_conversation(current_user.id, conversation_id)
        .await?;

    Ok(Json(ConversationWithMessages {
        conversation: conversation.into(),
        messages: messages.into_iter().map(schemas::Message::from).collect(),
    }))
}

async fn update_conversation(
    Inject(conversation_service): Inject<dyn ConversationService>,
    CurrentUser(current_user): CurrentUser,
    ApiPath(conversation_id): ApiPath<i64>,
    ApiJson(update): ApiJson<UpdateConversation>,
) -> Result<Json<Conversation>, ServiceError> {
    let conversation = conversation_service
        .rename_conversation(
            current_user.id,
            conversation_id,
            ConversationPatch {
                title: update.title,
            },
        )
        .await?;

    Ok(Json(conversation.into()))
}

async fn delete_conversation(
    Inject(conversation_service): Inject<dyn ConversationService>,
    CurrentUser(current_user): CurrentUser,
    ApiPath(conversation_id): ApiPath<i64>,
) -> Result<StatusCode, ServiceError> {
    conversation_service
        .delete_conversation(current_user.id, conversation_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct CreateConversation {
        pub title: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct UpdateConversation {
        pub title: Option<String>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Conversation {
        pub id: i64,
        pub title: String,
        pub user_id: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl From<entities::Conversation> for Conversation {
        fn from(conversation: entities::Conversation) -> Self {
            Conversation {
                id: conversation.id,
                title: conversation.title,
                user_id: conversation.user_id,
                created_at: conversation.created_at,
                updated_at: conversation.updated_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ConversationWithMessages {
        #[serde(flatten)]
        pub conversation: Conversation,
        pub messages: Vec<Message>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "lowercase")]
    pub enum MessageRole {
        User,
        Assistant,
    }

    impl From<entities::MessageRole> for MessageRole {
        fn from(role: entities::MessageRole) -> Self {
            match role {
                entities::MessageRole::User => MessageRole::User,
                entities::MessageRole::Assistant => MessageRole::Assistant,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Message {
        pub id: i64,
        pub conversation_id: i64,
        pub content: String,
        pub role: MessageRole,
        pub document_reference: Option<String>,
        pub token_count: Option<i64>,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::Message> for Message {
        fn from(message: entities::Message) -> Self {
            Message {
                id: message.id,
                conversation_id: message.conversation_id,
                content: message.content,
                role: message.role.into(),
                document_reference: message.document_reference,
                token_count: message.token_count,
                created_at: message.created_at,
            }
        }
    }
}
