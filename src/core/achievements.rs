//! Achievement counters and the badges they unlock.

use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::traits::AchievementService;
use crate::infrastructure::entities::{Badge, UserAchievement, UserBadge};
use crate::infrastructure::traits::AchievementRepository;
use async_trait::async_trait;
use di::{Ref, injectable};
use log::{info, warn};

pub const CONVERSATIONS: &str = "conversations";
pub const MESSAGES: &str = "messages";
pub const DOCUMENTS: &str = "documents";
pub const API_KEYS: &str = "api_keys";
pub const WEBHOOKS: &str = "webhooks";

/// Outcome of one increment: the updated counter and the badges it unlocked.
#[derive(Debug, Clone)]
pub struct AchievementProgress {
    pub achievement: UserAchievement,
    pub new_badges: Vec<Badge>,
}

#[injectable(AchievementService)]
pub struct DefaultAchievementService {
    repo: Ref<dyn AchievementRepository>,
}

impl DefaultAchievementService {
    pub fn new(repo: Ref<dyn AchievementRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AchievementService for DefaultAchievementService {
    async fn increment(
        &self,
        user_id: i64,
        kind: &str,
        amount: i64,
    ) -> ServiceResult<AchievementProgress> {
        if amount < 1 {
            return Err(ServiceError::Validation(
                "amount must be a positive integer".to_owned(),
            ));
        }
        if kind.trim().is_empty() {
            return Err(ServiceError::Validation("type is required".to_owned()));
        }

        let achievement = self.repo.increment_achievement(user_id, kind, amount).await?;
        let qualifying = self.repo.qualifying_badges(kind, achievement.count).await?;

        let mut new_badges = Vec::new();
        for badge in qualifying {
            // grant_badge is a no-op for badges the user already holds
            if self.repo.grant_badge(user_id, badge.id).await?.is_some() {
                info!("user {user_id} earned badge \"{}\"", badge.name);
                new_badges.push(badge);
            }
        }

        Ok(AchievementProgress {
            achievement,
            new_badges,
        })
    }

    async fn record(&self, user_id: i64, kind: &str, amount: i64) {
        if let Err(e) = self.increment(user_id, kind, amount).await {
            warn!("failed to record {kind} achievement for user {user_id}: {e}");
        }
    }

    async fn list_badges(&self) -> ServiceResult<Vec<Badge>> {
        Ok(self.repo.list_badges().await?)
    }

    async fn list_user_badges(&self, user_id: i64) -> ServiceResult<Vec<UserBadge>> {
        Ok(self.repo.list_user_badges(user_id).await?)
    }

    async fn list_achievements(&self, user_id: i64) -> ServiceResult<Vec<UserAchievement>> {
        Ok(self.repo.list_achievements(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::DatabaseConnection;
    use crate::infrastructure::repositories::DbAchievementRepository;
    use std::sync::Arc;

    async fn service() -> DefaultAchievementService {
        let connection = Arc::new(DatabaseConnection::in_memory().await.unwrap());
        DefaultAchievementService::new(Arc::new(DbAchievementRepository::new(connection)))
    }

    #[tokio::test]
    async fn test_first_increment_creates_counter() {
        let service = service().await;

        let progress = service.increment(1, MESSAGES, 1).await.unwrap();

        assert_eq!(progress.achievement.count, 1);
        assert_eq!(progress.achievement.kind, MESSAGES);
        assert!(progress.new_badges.is_empty());
    }

    #[tokio::test]
    async fn test_counter_is_monotonic() {
        let service = service().await;

        let mut last = 0;
        for amount in [1, 3, 2, 5] {
            let progress = service.increment(1, DOCUMENTS, amount).await.unwrap();
            assert_eq!(progress.achievement.count, last + amount);
            last = progress.achievement.count;
        }
    }

    #[tokio::test]
    async fn test_threshold_crossing_grants_badge_once() {
        let service = service().await;

        let first = service.increment(1, CONVERSATIONS, 1).await.unwrap();
        let second = service.increment(1, CONVERSATIONS, 1).await.unwrap();

        assert_eq!(first.new_badges.len(), 1);
        assert_eq!(first.new_badges[0].name, "Conversation Starter");
        assert!(second.new_badges.is_empty());
        assert_eq!(service.list_user_badges(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_badge_below_threshold() {
        let service = service().await;

        let progress = service.increment(1, MESSAGES, 9).await.unwrap();
        assert!(progress.new_badges.is_empty());

        let progress = service.increment(1, MESSAGES, 1).await.unwrap();
        assert_eq!(progress.new_badges.len(), 1);
        assert_eq!(progress.new_badges[0].name, "Chat Enthusiast");
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let service = service().await;

        assert!(matches!(
            service.increment(1, MESSAGES, 0).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(service.list_achievements(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counters_are_per_user() {
        let service = service().await;

        service.record(1, API_KEYS, 1).await;
        service.record(2, API_KEYS, 2).await;

        let first = service.list_achievements(1).await.unwrap();
        let second = service.list_achievements(2).await.unwrap();
        assert_eq!(first[0].count, 1);
        assert_eq!(second[0].count, 2);
    }
}
