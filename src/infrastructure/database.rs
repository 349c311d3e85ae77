//! Pooled SQLite connection

use crate::config::AppConfig;
use di::{Ref, inject, injectable};
use log::{info, warn};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::ops::{Deref, DerefMut};
use std::sync::RwLock;

/// Pool handed out instead of a fresh one while tests run.
static TEST_POOL: RwLock<Option<SqlitePool>> = RwLock::new(None);

/// Connections the pool may open for `url`. Every connection to a private
/// in-memory database gets its own empty database, so those pools hold one.
fn pool_size(url: &str, requested: u32) -> u32 {
    let private_memory =
        url.contains(":memory:") || (url.contains("mode=memory") && !url.contains("cache=shared"));
    if private_memory {
        if requested > 1 {
            warn!("{url} is a private in-memory database, using a single connection");
        }
        1
    } else {
        requested.max(1)
    }
}

pub struct DatabaseConnection {
    connection: SqlitePool,
}

#[injectable]
impl DatabaseConnection {
    #[inject]
    pub fn create(config: Ref<AppConfig>) -> DatabaseConnection {
        if let Some(pool) = TEST_POOL.read().ok().and_then(|pool| pool.clone()) {
            return DatabaseConnection { connection: pool };
        }

        // In-memory databases live exactly as long as their connection, so
        // pooled connections must never be recycled.
        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size(
                &config.database_url,
                config.database_max_connections,
            ))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_lazy(&config.database_url)
            .expect("Cannot connect to database");

        DatabaseConnection { connection: pool }
    }
}

impl DatabaseConnection {
    pub fn from_pool(connection: SqlitePool) -> DatabaseConnection {
        DatabaseConnection { connection }
    }

    /// Opens a private in-memory database with the schema applied.
    pub async fn in_memory() -> Result<DatabaseConnection, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let connection = DatabaseConnection { connection: pool };
        connection.migrate().await?;
        Ok(connection)
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!().run(&self.connection).await?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn set_test_pool(pool: SqlitePool) {
        if let Ok(mut slot) = TEST_POOL.write() {
            *slot = Some(pool);
        }
    }

    pub fn clear_test_pool() {
        if let Ok(mut slot) = TEST_POOL.write() {
            *slot = None;
        }
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl DerefMut for DatabaseConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}
