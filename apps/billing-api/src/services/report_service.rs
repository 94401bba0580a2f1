//! Sales analytics service.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use dine_core::analytics::{ReportPeriod, SalesReport};
use dine_db::Database;

use crate::cache::{get_json, set_json, ReadCache};
use crate::config::ApiConfig;
use crate::error::ApiResult;

/// Query for the analytics dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub days: Option<u32>,
}

#[derive(Clone)]
pub struct ReportService {
    db: Database,
    cache: Arc<dyn ReadCache>,
    config: Arc<ApiConfig>,
}

impl ReportService {
    pub fn new(db: Database, cache: Arc<dyn ReadCache>, config: Arc<ApiConfig>) -> Self {
        ReportService { db, cache, config }
    }

    /// Sales report for the period the query resolves to, relative to today (UTC).
    pub async fn analytics(&self, query: &AnalyticsQuery) -> ApiResult<SalesReport> {
        self.analytics_on(query, Utc::now().date_naive()).await
    }

    async fn analytics_on(&self, query: &AnalyticsQuery, today: NaiveDate) -> ApiResult<SalesReport> {
        let period = ReportPeriod::resolve(query.month, query.year, query.days, today)?;
        // The summary embeds today's figures, so the key carries the day too
        let key = format!("{}:{}", period.cache_key(), today);

        if let Some(report) = get_json::<SalesReport>(self.cache.as_ref(), &key) {
            debug!(key = %key, "Analytics served from cache");
            return Ok(report);
        }

        let report = self.db.reports().sales_report(&period, today).await?;
        set_json(self.cache.as_ref(), &key, &report, self.config.daily_stats_ttl());
        Ok(report)
    }
}
