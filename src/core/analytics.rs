use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::traits::AnalyticsService;
use crate::infrastructure::entities::Analytics;
use crate::infrastructure::traits::AnalyticsRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use di::{Ref, injectable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageSummary {
    pub total_tokens: i64,
    /// Dollars.
    pub total_cost: f64,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct UsageReport {
    pub analytics: Vec<Analytics>,
    pub summary: UsageSummary,
}

impl UsageSummary {
    pub fn of(rows: &[Analytics]) -> UsageSummary {
        let total_tokens = rows.iter().map(|row| row.tokens_used).sum();
        let total_cents: i64 = rows.iter().map(|row| row.cost).sum();
        UsageSummary {
            total_tokens,
            total_cost: total_cents as f64 / 100.0,
            count: rows.len(),
        }
    }
}

/// Which end of a range a bare date stands for.
#[derive(Debug, Clone, Copy)]
pub enum RangeBound {
    Start,
    End,
}

/// Accepts an RFC 3339 timestamp or a `YYYY-MM-DD` date; a date covers the
/// whole day for the given bound.
pub fn parse_range_bound(raw: &str, bound: RangeBound) -> ServiceResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ServiceError::Validation(format!("invalid date: {raw}")))?;
    let time = match bound {
        RangeBound::Start => NaiveTime::MIN,
        RangeBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| ServiceError::Validation(format!("invalid date: {raw}")))?,
    };
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

#[injectable(AnalyticsService)]
pub struct DefaultAnalyticsService {
    repo: Ref<dyn AnalyticsRepository>,
}

impl DefaultAnalyticsService {
    pub fn new(repo: Ref<dyn AnalyticsRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AnalyticsService for DefaultAnalyticsService {
    async fn record_usage(
        &self,
        user_id: i64,
        tokens_used: i64,
        cost_cents: i64,
    ) -> ServiceResult<Analytics> {
        Ok(self
            .repo
            .create_analytics(user_id, tokens_used, cost_cents)
            .await?)
    }

    async fn summarize(
        &self,
        user_id: i64,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ServiceResult<UsageReport> {
        let start = start.unwrap_or(DateTime::UNIX_EPOCH);
        let end = end.unwrap_or_else(Utc::now);

        let analytics: Vec<Analytics> = self
            .repo
            .list_analytics(user_id)
            .await?
            .into_iter()
            .filter(|row| row.date >= start && row.date <= end)
            .collect();

        Ok(UsageReport {
            summary: UsageSummary::of(&analytics),
            analytics,
        })
    }
}
