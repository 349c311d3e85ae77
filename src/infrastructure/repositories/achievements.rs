use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{Badge, UserAchievement, UserBadge};
use crate::infrastructure::traits::AchievementRepository;
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::error;

#[injectable(AchievementRepository)]
pub struct DbAchievementRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbAchievementRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl AchievementRepository for DbAchievementRepository {
    async fn list_badges(&self) -> Result<Vec<Badge>, ()> {
        sqlx::query_as("SELECT * FROM badges ORDER BY id ASC")
            .fetch_all(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn qualifying_badges(&self, criteria: &str, count: i64) -> Result<Vec<Badge>, ()> {
        sqlx::query_as(
            "SELECT * FROM badges WHERE criteria = ? AND threshold <= ? ORDER BY threshold ASC, id ASC",
        )
        .bind(criteria)
        .bind(count)
        .fetch_all(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn list_user_badges(&self, user_id: i64) -> Result<Vec<UserBadge>, ()> {
        sqlx::query_as("SELECT * FROM user_badges WHERE user_id = ? ORDER BY id ASC")
            .bind(user_id)
            .fetch_all(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn grant_badge(&self, user_id: i64, badge_id: i64) -> Result<Option<UserBadge>, ()> {
        // A conflicting row yields no RETURNING row, so a second grant is a no-op.
        sqlx::query_as(
            "INSERT INTO user_badges (user_id, badge_id, earned_at) VALUES (?, ?, ?) \
             ON CONFLICT (user_id, badge_id) DO NOTHING RETURNING *",
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(Utc::now())
        .fetch_optional(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }

    async fn list_achievements(&self, user_id: i64) -> Result<Vec<UserAchievement>, ()> {
        sqlx::query_as("SELECT * FROM user_achievements WHERE user_id = ? ORDER BY id ASC")
            .bind(user_id)
            .fetch_all(&**self.connection)
            .await
            .map_err(|e| error!("{e}"))
    }

    async fn increment_achievement(
        &self,
        user_id: i64,
        kind: &str,
        amount: i64,
    ) -> Result<UserAchievement, ()> {
        sqlx::query_as(
            "INSERT INTO user_achievements (user_id, kind, count, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT (user_id, kind) DO UPDATE SET \
             count = user_achievements.count + excluded.count, updated_at = excluded.updated_at \
             RETURNING *",
        )
        .bind(user_id)
        .bind(kind)
        .bind(amount)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }
}
