//! Document upload and management

use crate::api::CurrentUser;
use crate::api::extractors::ApiPath;
use crate::api::documents::schemas::Document;
use crate::core::documents::{MAX_UPLOAD_BYTES, Upload};
use crate::core::errors::ServiceError;
use crate::core::traits::DocumentService;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use di_axum::Inject;
use log::warn;

/// Room for the multipart framing around a maximum-size file.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(list_documents)
                .post(upload_document)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/:id", delete(delete_document))
}

async fn list_documents(
    Inject(document_service): Inject<dyn DocumentService>,
    CurrentUser(current_user): CurrentUser,
) -> Result<Json<Vec<Document>>, ServiceError> {
    let documents = document_service.list_documents(current_user.id).await?;
    Ok(Json(documents.into_iter().map(Document::from).collect()))
}

async fn upload_document(
    Inject(document_service): Inject<dyn DocumentService>,
    CurrentUser(current_user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Document>), ServiceError> {
    let mut multipart =
        multipart.map_err(|rejection| ServiceError::Validation(rejection.body_text()))?;
    let unreadable = |e: axum::extract::multipart::MultipartError| {
        warn!("could not read upload: {e}");
        ServiceError::Validation("File too large or malformed upload".to_owned())
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("document.pdf").to_owned();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = field.bytes().await.map_err(unreadable)?;
        upload = Some(Upload {
            name,
            mime_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| ServiceError::Validation("No file uploaded".to_owned()))?;
    let document = document_service
        .upload_document(current_user.id, upload)
        .await?;

    Ok((StatusCode::CREATED, Json(document.into())))
}

async fn delete_document(
    Inject(document_service): Inject<dyn DocumentService>,
    CurrentUser(current_user): CurrentUser,
    ApiPath(document_id): ApiPath<i64>,
) -> Result<StatusCode, ServiceError> {
    document_service
        .delete_document(current_user.id, document_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::Serialize;

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Document {
        pub id: i64,
        pub name: String,
        pub user_id: i64,
        pub content: String,
        #[serde(rename = "type")]
        pub mime_type: String,
        /// Kilobytes.
        pub size: i64,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::Document> for Document {
        fn from(document: entities::Document) -> Self {
            Document {
                id: document.id,
                name: document.name,
                user_id: document.user_id,
                content: document.content,
                mime_type: document.mime_type,
                size: document.size,
                created_at: document.created_at,
            }
        }
    }
}
