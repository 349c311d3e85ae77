use crate::core::achievements;
use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::traits::{AchievementService, DocumentService};
use crate::infrastructure::entities::{Document, NewDocument};
use crate::infrastructure::traits::{DocumentRepository, TextExtractor};
use async_trait::async_trait;
use di::{Ref, injectable};
use log::{info, warn};

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A file received from a client, not yet processed.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// One context block per document, in the given order.
pub fn format_context<'a>(documents: impl IntoIterator<Item = &'a Document>) -> String {
    documents
        .into_iter()
        .map(|document| {
            format!(
                "\n\nDocument: {}\nContent: {}\n",
                document.name, document.content
            )
        })
        .collect()
}

#[injectable(DocumentService)]
pub struct DefaultDocumentService {
    repo: Ref<dyn DocumentRepository>,
    extractor: Ref<dyn TextExtractor>,
    achievements: Ref<dyn AchievementService>,
}

impl DefaultDocumentService {
    pub fn new(
        repo: Ref<dyn DocumentRepository>,
        extractor: Ref<dyn TextExtractor>,
        achievements: Ref<dyn AchievementService>,
    ) -> Self {
        Self {
            repo,
            extractor,
            achievements,
        }
    }

    async fn owned_document(&self, user_id: i64, document_id: i64) -> ServiceResult<Document> {
        self.repo
            .get_document(document_id)
            .await?
            .filter(|document| document.user_id == user_id)
            .ok_or_else(|| ServiceError::NotFound("Document not found".to_owned()))
    }
}

#[async_trait]
impl DocumentService for DefaultDocumentService {
    async fn list_documents(&self, user_id: i64) -> ServiceResult<Vec<Document>> {
        Ok(self.repo.list_documents(user_id).await?)
    }

    async fn upload_document(&self, user_id: i64, upload: Upload) -> ServiceResult<Document> {
        if upload.mime_type != PDF_MIME_TYPE {
            return Err(ServiceError::Validation(
                "Only PDF files are allowed".to_owned(),
            ));
        }
        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ServiceError::Validation(
                "File too large, the limit is 10MB".to_owned(),
            ));
        }

        let size_kb = upload.bytes.len().div_ceil(1024) as i64;
        let extractor = self.extractor.clone();
        let bytes = upload.bytes;
        let content = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
            .await
            .map_err(|e| {
                warn!("text extraction task failed: {e}");
                ServiceError::Storage
            })?
            .map_err(|e| {
                warn!("PDF parsing error: {e}");
                ServiceError::Validation("Failed to parse PDF file".to_owned())
            })?;

        let document = self
            .repo
            .create_document(NewDocument {
                name: upload.name,
                user_id,
                content,
                mime_type: upload.mime_type,
                size: size_kb,
            })
            .await?;
        info!("user {user_id} uploaded document {}", document.id);

        self.achievements
            .record(user_id, achievements::DOCUMENTS, 1)
            .await;

        Ok(document)
    }

    async fn delete_document(&self, user_id: i64, document_id: i64) -> ServiceResult<()> {
        self.owned_document(user_id, document_id).await?;
        self.repo.delete_document(document_id).await?;
        Ok(())
    }

    async fn assemble_context(&self, user_id: i64, document_ids: &[i64]) -> ServiceResult<String> {
        let mut documents = Vec::with_capacity(document_ids.len());
        for &document_id in document_ids {
            match self.repo.get_document(document_id).await? {
                Some(document) if document.user_id == user_id => documents.push(document),
                _ => {}
            }
        }
        Ok(format_context(&documents))
    }
}
