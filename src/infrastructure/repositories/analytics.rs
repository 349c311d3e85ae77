use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::Analytics;
use crate::infrastructure::traits::AnalyticsRepository;
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::error;

#[injectable(AnalyticsRepository)]
pub struct DbAnalyticsRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbAnalyticsRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl AnalyticsRepository for DbAnalyticsRepository {
    async fn create_analytics(
        &self,
        user_id: i64,
        tokens_used: i64,
        cost_cents: i64,
    ) -> Result<Analytics, ()> {
        sqlx::query_as(
            "INSERT INTO analytics (user_id, tokens_used, cost, date) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(user_id)
        .bind(tokens_used)
        .bind(cost_cents)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn list_analytics(&self, user_id: i64) -> Result<Vec<Analytics>, ()> {
        sqlx::query_as("SELECT * FROM analytics WHERE user_id = ? ORDER BY id ASC")
            .bind(user_id)
            .fetch_all(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }
}
