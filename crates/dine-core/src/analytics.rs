//! # Sales Analytics
//!
//! Report period resolution and the report shapes served to the dashboard.
//! The aggregation queries themselves live in `dine-db`.
//!
//! All days are UTC calendar days.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::validation::ValidationResult;

/// Longest `days` window accepted.
pub const MAX_REPORT_DAYS: u32 = 366;

// =============================================================================
// Report Period
// =============================================================================

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportPeriod {
    /// Resolves query parameters into a period.
    ///
    /// - `month` + `year` → that calendar month
    /// - `days = N` → `today - N ..= today`
    /// - otherwise → the month containing `today`
    ///
    /// A lone `month` or `year` is ignored, like a missing one.
    pub fn resolve(
        month: Option<u32>,
        year: Option<i32>,
        days: Option<u32>,
        today: NaiveDate,
    ) -> ValidationResult<Self> {
        if let (Some(month), Some(year)) = (month, year) {
            return Self::month(year, month);
        }

        if let Some(days) = days {
            if days > MAX_REPORT_DAYS {
                return Err(ValidationError::OutOfRange {
                    field: "days".to_string(),
                    min: 0,
                    max: MAX_REPORT_DAYS as i64,
                });
            }
            let start = today
                .checked_sub_days(Days::new(days as u64))
                .unwrap_or(NaiveDate::MIN);
            return Ok(ReportPeriod { start, end: today });
        }

        Self::month(today.year(), today.month())
    }

    /// The full calendar month `year-month`.
    pub fn month(year: i32, month: u32) -> ValidationResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            }
        })?;

        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };

        let end = next_month
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "year".to_string(),
                reason: format!("{} is outside the supported range", year),
            })?;

        Ok(ReportPeriod { start, end })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        ReportPeriod { start: date, end: date }
    }

    /// First instant of the period.
    pub fn start_at(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// First instant after the period.
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.end
            .succ_opt()
            .unwrap_or(NaiveDate::MAX)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
    }

    /// Cache key for the report covering this period.
    pub fn cache_key(&self) -> String {
        format!("dailyStats:{}:{}", self.start, self.end)
    }
}

// =============================================================================
// Report Shapes
// =============================================================================

/// Revenue figures for today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DayStats {
    pub revenue: Money,
    pub bills: u64,
    pub average_bill: Money,
}

/// Revenue figures for the requested period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodStats {
    pub revenue: Money,
    pub bills: u64,
    pub average_bill: Money,
    pub discount: Money,
    pub tax: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportSummary {
    /// Paid orders, all time.
    pub total_bills: u64,
    /// Orders in any status, all time.
    pub total_orders: u64,
    pub today: DayStats,
    pub period: PeriodStats,
}

/// One row of the daily revenue chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyRevenue {
    /// `YYYY-MM-DD`
    pub date: String,
    pub revenue: Money,
    pub bills: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentModeStat {
    pub payment_method: PaymentMethod,
    pub count: u64,
    pub revenue: Money,
}

/// Everything the analytics dashboard shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesReport {
    pub summary: ReportSummary,
    pub daily_revenue: Vec<DailyRevenue>,
    pub payment_mode_stats: Vec<PaymentModeStat>,
}

/// Mean bill value, rounded half-up to a whole unit. Zero when there are no bills.
pub fn average_bill(revenue: Money, bills: u64) -> Money {
    if bills == 0 {
        return Money::zero();
    }
    let bills = bills as i64;
    Money::from_units((revenue.units() * 2 + bills) / (bills * 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_and_year() {
        let p = ReportPeriod::resolve(Some(2), Some(2024), None, date(2024, 6, 15)).unwrap();
        assert_eq!(p.start, date(2024, 2, 1));
        assert_eq!(p.end, date(2024, 2, 29));

        let p = ReportPeriod::resolve(Some(12), Some(2023), Some(7), date(2024, 6, 15)).unwrap();
        assert_eq!(p.end, date(2023, 12, 31));
    }

    #[test]
    fn test_days_window() {
        let p = ReportPeriod::resolve(None, None, Some(7), date(2024, 3, 3)).unwrap();
        assert_eq!(p.start, date(2024, 2, 25));
        assert_eq!(p.end, date(2024, 3, 3));

        assert!(ReportPeriod::resolve(None, None, Some(MAX_REPORT_DAYS + 1), date(2024, 3, 3)).is_err());
    }

    #[test]
    fn test_default_is_current_month() {
        let p = ReportPeriod::resolve(None, Some(2020), None, date(2024, 4, 10)).unwrap();
        assert_eq!(p.start, date(2024, 4, 1));
        assert_eq!(p.end, date(2024, 4, 30));
    }

    #[test]
    fn test_invalid_month() {
        assert!(ReportPeriod::resolve(Some(13), Some(2024), None, date(2024, 1, 1)).is_err());
        assert!(ReportPeriod::resolve(Some(0), Some(2024), None, date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_instant_bounds_and_cache_key() {
        let p = ReportPeriod::day(date(2024, 5, 1));
        assert_eq!(p.start_at().to_rfc3339(), "2024-05-01T00:00:00+00:00");
        assert_eq!(p.end_exclusive().to_rfc3339(), "2024-05-02T00:00:00+00:00");
        assert_eq!(p.cache_key(), "dailyStats:2024-05-01:2024-05-01");
    }

    #[test]
    fn test_average_bill() {
        assert_eq!(average_bill(Money::zero(), 0), Money::zero());
        assert_eq!(average_bill(Money::from_units(440), 2).units(), 220);
        assert_eq!(average_bill(Money::from_units(5), 2).units(), 3);
        assert_eq!(average_bill(Money::from_units(10), 3).units(), 3);
    }
}
