pub mod database;
pub mod entities;
pub mod groq;
pub mod pdf;
pub mod repositories;
pub mod traits;
pub mod webhooks;
