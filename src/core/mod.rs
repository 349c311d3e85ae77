pub mod accounts;
pub mod achievements;
pub mod analytics;
pub mod assistant;
pub mod conversations;
pub mod documents;
pub mod errors;
pub mod integrations;
pub mod notifier;
pub mod public_chat;
pub mod settings;
pub mod traits;
