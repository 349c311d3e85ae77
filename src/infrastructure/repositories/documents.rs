use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{Document, NewDocument};
use crate::infrastructure::traits::DocumentRepository;
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::error;

#[injectable(DocumentRepository)]
pub struct DbDocumentRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbDocumentRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl DocumentRepository for DbDocumentRepository {
    async fn get_document(&self, document_id: i64) -> Result<Option<Document>, ()> {
        sqlx::query_as("SELECT * FROM documents WHERE id = ?")
            .bind(document_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn list_documents(&self, user_id: i64) -> Result<Vec<Document>, ()> {
        sqlx::query_as("SELECT * FROM documents WHERE user_id = ? ORDER BY id ASC")
            .bind(user_id)
            .fetch_all(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document, ()> {
        sqlx::query_as(
            "INSERT INTO documents (name, user_id, content, mime_type, size, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(document.name)
        .bind(document.user_id)
        .bind(document.content)
        .bind(document.mime_type)
        .bind(document.size)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn delete_document(&self, document_id: i64) -> Result<bool, ()> {
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(document_id)
            .execute(&**self.connection)
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| error!("{e}"))
    }
}
