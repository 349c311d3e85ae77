//! Badges and achievement counters

use crate::api::CurrentUser;
use crate::api::extractors::ApiJson;
use crate::api::achievements::schemas::{
    Achievement, AchievementProgress, Badge, IncrementAchievement, UserBadge,
};
use crate::core::errors::ServiceError;
use crate::core::traits::AchievementService;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/badges", get(list_badges))
        .route("/user-badges", get(list_user_badges))
        .route("/achievements", get(list_achievements))
        .route("/achievements/increment", post(increment))
}

async fn list_badges(
    Inject(achievements): Inject<dyn AchievementService>,
    CurrentUser(_): CurrentUser,
) -> Result<Json<Vec<Badge>>, ServiceError> {
    let badges = achievements.list_badges().await?;
    Ok(Json(badges.into_iter().map(Badge::from).collect()))
}

async fn list_user_badges(
    Inject(achievements): Inject<dyn AchievementService>,
    CurrentUser(current_user): CurrentUser,
) -> Result<Json<Vec<UserBadge>>, ServiceError> {
    let badges = achievements.list_user_badges(current_user.id).await?;
    Ok(Json(badges.into_iter().map(UserBadge::from).collect()))
}

async fn list_achievements(
    Inject(achievements): Inject<dyn AchievementService>,
    CurrentUser(current_user): CurrentUser,
) -> Result<Json<Vec<Achievement>>, ServiceError> {
    let counters = achievements.list_achievements(current_user.id).await?;
    Ok(Json(counters.into_iter().map(Achievement::from).collect()))
}

async fn increment(
    Inject(achievements): Inject<dyn AchievementService>,
    CurrentUser(current_user): CurrentUser,
    ApiJson(request): ApiJson<IncrementAchievement>,
) -> Result<Json<AchievementProgress>, ServiceError> {
    let progress = achievements
        .increment(current_user.id, &request.kind, request.amount.unwrap_or(1))
        .await?;
    Ok(Json(progress.into()))
}

pub mod schemas {
    use crate::core::achievements;
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct IncrementAchievement {
        #[serde(rename = "type")]
        pub kind: String,
        pub amount: Option<i64>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Badge {
        pub id: i64,
        pub name: String,
        pub description: String,
        pub icon: String,
        pub criteria: String,
        pub threshold: i64,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::Badge> for Badge {
        fn from(badge: entities::Badge) -> Self {
            Badge {
                id: badge.id,
                name: badge.name,
                description: badge.description,
                icon: badge.icon,
                criteria: badge.criteria,
                threshold: badge.threshold,
                created_at: badge.created_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct UserBadge {
        pub id: i64,
        pub user_id: i64,
        pub badge_id: i64,
        pub earned_at: DateTime<Utc>,
    }

    impl From<entities::UserBadge> for UserBadge {
        fn from(badge: entities::UserBadge) -> Self {
            UserBadge {
                id: badge.id,
                user_id: badge.user_id,
                badge_id: badge.badge_id,
                earned_at: badge.earned_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Achievement {
        pub id: i64,
        pub user_id: i64,
        #[serde(rename = "type")]
        pub kind: String,
        pub count: i64,
        pub updated_at: DateTime<Utc>,
    }

    impl From<entities::UserAchievement> for Achievement {
        fn from(achievement: entities::UserAchievement) -> Self {
            Achievement {
                id: achievement.id,
                user_id: achievement.user_id,
                kind: achievement.kind,
                count: achievement.count,
                updated_at: achievement.updated_at,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct AchievementProgress {
        pub achievement: Achievement,
        pub new_badges: Vec<Badge>,
    }

    impl From<achievements::AchievementProgress> for AchievementProgress {
        fn from(progress: achievements::AchievementProgress) -> Self {
            AchievementProgress {
                achievement: progress.achievement.into(),
                new_badges: progress.new_badges.into_iter().map(Badge::from).collect(),
            }
        }
    }
}
