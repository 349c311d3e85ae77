use crate::api::CurrentUser;
use crate::api::extractors::ApiQuery;
use crate::api::analytics::schemas::{AnalyticsQuery, UsageReport};
use crate::core::analytics::{RangeBound, parse_range_bound};
use crate::core::errors::ServiceError;
use crate::core::traits::AnalyticsService;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new().route("/", get(usage_report))
}

async fn usage_report(
    Inject(analytics): Inject<dyn AnalyticsService>,
    CurrentUser(current_user): CurrentUser,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<UsageReport>, ServiceError> {
    let start = query
        .start_date
        .as_deref()
        .map(|raw| parse_range_bound(raw, RangeBound::Start))
        .transpose()?;
    let end = query
        .end_date
        .as_deref()
        .map(|raw| parse_range_bound(raw, RangeBound::End))
        .transpose()?;

    let report = analytics.summarize(current_user.id, start, end).await?;
    Ok(Json(report.into()))
}

pub mod schemas {
    use crate::core::analytics;
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct AnalyticsQuery {
        pub start_date: Option<String>,
        pub end_date: Option<String>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Analytics {
        pub id: i64,
        pub user_id: i64,
        pub tokens_used: i64,
        /// Cents.
        pub cost: i64,
        pub date: DateTime<Utc>,
    }

    impl From<entities::Analytics> for Analytics {
        fn from(row: entities::Analytics) -> Self {
            Analytics {
                id: row.id,
                user_id: row.user_id,
                tokens_used: row.tokens_used,
                cost: row.cost,
                date: row.date,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Summary {
        pub total_tokens: i64,
        pub total_cost: f64,
        pub count: usize,
    }

    #[derive(Serialize, Debug)]
    pub struct UsageReport {
        pub analytics: Vec<Analytics>,
        pub summary: Summary,
    }

    impl From<analytics::UsageReport> for UsageReport {
        fn from(report: analytics::UsageReport) -> Self {
            UsageReport {
                analytics: report.analytics.into_iter().map(Analytics::from).collect(),
                summary: Summary {
                    total_tokens: report.summary.total_tokens,
                    total_cost: report.summary.total_cost,
                    count: report.summary.count,
                },
            }
        }
    }
}
