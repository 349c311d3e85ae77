use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{Conversation, ConversationPatch, Message, NewMessage};
use crate::infrastructure::traits::ConversationRepository;
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::error;

#[injectable(ConversationRepository)]
pub struct DbConversationRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbConversationRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ConversationRepository for DbConversationRepository {
    async fn list_conversations(&self, user_id: i64) -> Result<Vec<Conversation>, ()> {
        sqlx::query_as(
            "SELECT * FROM conversations WHERE user_id = ? ORDER BY datetime(updated_at) DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn get_conversation(&self, conversation_id: i64) -> Result<Option<Conversation>, ()> {
        sqlx::query_as("SELECT * FROM conversations WHERE id = ?")
            .bind(conversation_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn create_conversation(&self, user_id: i64, title: String) -> Result<Conversation, ()> {
        let now = Utc::now();
        sqlx::query_as(
            "INSERT INTO conversations (title, user_id, created_at, updated_at) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(title)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn update_conversation(
        &self,
        conversation_id: i64,
        patch: ConversationPatch,
    ) -> Result<Option<Conversation>, ()> {
        sqlx::query_as(
            "UPDATE conversations SET title = COALESCE(?, title), updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(patch.title)
        .bind(Utc::now())
        .bind(conversation_id)
        .fetch_optional(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn touch_conversation(&self, conversation_id: i64) -> Result<(), ()> {
        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(conversation_id)
            .execute(&**self.connection)
            .await
            .map(|_| ())
            .map_err(|e| error!("{e}"))
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<bool, ()> {
        sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(conversation_id)
            .execute(&**self.connection)
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| error!("{e}"))
    }

    async fn list_conversation_messages(&self, conversation_id: i64) -> Result<Vec<Message>, ()> {
        sqlx::query_as("SELECT * FROM messages WHERE conversation_id = ? ORDER BY id ASC")
            .bind(conversation_id)
            .fetch_all(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, ()> {
        sqlx::query_as(
            "INSERT INTO messages (conversation_id, content, role, document_reference, token_count, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(message.conversation_id)
        .bind(message.content)
        .bind(message.role)
        .bind(message.document_reference)
        .bind(message.token_count)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }
}
