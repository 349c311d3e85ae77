//! Runtime configuration read from the environment (and `.env`).

use di::{inject, injectable};
use log::warn;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_address: String,
    pub completions_url: String,
    /// Process-wide key used when a user has no key in their settings.
    pub default_api_key: Option<String>,
    /// Key used by the unauthenticated public chat surface.
    pub admin_api_key: Option<String>,
    pub http_timeout: Duration,
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "sqlite::memory:".to_owned(),
            database_max_connections: 1,
            bind_address: "0.0.0.0:3000".to_owned(),
            completions_url: DEFAULT_COMPLETIONS_URL.to_owned(),
            default_api_key: None,
            admin_api_key: None,
            http_timeout: Duration::from_secs(30),
            cors_origins: vec![
                "http://localhost:3000".to_owned(),
                "http://localhost:5173".to_owned(),
            ],
        }
    }
}

#[injectable]
impl AppConfig {
    #[inject]
    pub fn from_env() -> AppConfig {
        dotenvy::dotenv().ok();
        let defaults = AppConfig::default();

        let default_api_key = non_empty_var("GROQ_API_KEY");
        let admin_api_key = non_empty_var("ADMIN_GROQ_API_KEY").or_else(|| default_api_key.clone());

        AppConfig {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parsed_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            completions_url: env::var("GROQ_API_URL").unwrap_or(defaults.completions_url),
            default_api_key,
            admin_api_key,
            http_timeout: Duration::from_secs(parsed_var(
                "HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => T::from_str(raw.trim()).unwrap_or_else(|_| {
            warn!("ignoring unparseable {name}={raw}");
            default
        }),
        Err(_) => default,
    }
}
