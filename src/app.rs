//! Wiring: the service collection and the HTTP application built on it.

use crate::api;
use crate::config::AppConfig;
use crate::core::accounts::{DefaultAccountService, StoredPasswordVerifier};
use crate::core::achievements::DefaultAchievementService;
use crate::core::analytics::DefaultAnalyticsService;
use crate::core::conversations::DefaultConversationService;
use crate::core::documents::DefaultDocumentService;
use crate::core::integrations::DefaultIntegrationService;
use crate::core::notifier::DefaultNotificationService;
use crate::core::public_chat::DefaultPublicChatService;
use crate::core::settings::DefaultSettingsService;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::groq::GroqCompletionClient;
use crate::infrastructure::pdf::PdfTextExtractor;
use crate::infrastructure::repositories::{
    DbAchievementRepository, DbAnalyticsRepository, DbConversationRepository,
    DbDocumentRepository, DbIntegrationRepository, DbSettingsRepository, DbUserRepository,
};
use crate::infrastructure::webhooks::HttpWebhookSender;
use axum::Router;
use axum::http::{HeaderValue, Method};
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use log::warn;
use tower_http::cors::{Any, CorsLayer};

/// Every service except the completion client and the configuration, which
/// callers add themselves.
pub fn base_services() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services
        .add(DatabaseConnection::singleton())
        .add(HttpWebhookSender::singleton())
        .add(PdfTextExtractor::singleton())
        .add(StoredPasswordVerifier::singleton())
        .add(DbUserRepository::scoped())
        .add(DbSettingsRepository::scoped())
        .add(DbConversationRepository::scoped())
        .add(DbDocumentRepository::scoped())
        .add(DbIntegrationRepository::scoped())
        .add(DbAnalyticsRepository::scoped())
        .add(DbAchievementRepository::scoped())
        .add(DefaultAccountService::scoped())
        .add(DefaultAchievementService::scoped())
        .add(DefaultAnalyticsService::scoped())
        .add(DefaultSettingsService::scoped())
        .add(DefaultDocumentService::scoped())
        .add(DefaultIntegrationService::scoped())
        .add(DefaultNotificationService::scoped())
        .add(DefaultConversationService::scoped())
        .add(DefaultPublicChatService::scoped());
    services
}

/// The production service collection.
pub fn services() -> ServiceCollection {
    let mut services = base_services();
    services
        .add(AppConfig::singleton())
        .add(GroqCompletionClient::singleton());
    services
}

pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_origin(origins)
}

/// The HTTP application on top of an already built provider.
pub fn router(provider: di::ServiceProvider, config: &AppConfig) -> Router {
    api::router()
        .layer(cors_layer(config))
        .with_provider(provider)
}
