//! SQLite-backed implementations of the repository traits.

mod achievements;
mod analytics;
mod conversations;
mod documents;
mod integrations;
mod users;

pub use achievements::DbAchievementRepository;
pub use analytics::DbAnalyticsRepository;
pub use conversations::DbConversationRepository;
pub use documents::DbDocumentRepository;
pub use integrations::DbIntegrationRepository;
pub use users::{DbSettingsRepository, DbUserRepository};
