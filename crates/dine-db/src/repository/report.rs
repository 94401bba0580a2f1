//! # Report Repository
//!
//! Sales aggregates over Paid orders for the analytics dashboard.
//!
//! Orders are attributed to the UTC day they were created on; the
//! `(status, created_at)` and `(payment_method, created_at)` indexes cover
//! these scans.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use dine_core::analytics::{
    average_bill, DailyRevenue, DayStats, PaymentModeStat, PeriodStats, ReportPeriod,
    ReportSummary, SalesReport,
};
use dine_core::{Money, PaymentMethod};

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    revenue: i64,
    bills: i64,
    discount: i64,
    tax: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct DailyRow {
    day: String,
    revenue: i64,
    bills: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    payment_method: PaymentMethod,
    count: i64,
    revenue: i64,
}

/// Repository for sales aggregates.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Builds the full dashboard report for `period`, with `today` for the
    /// day summary.
    pub async fn sales_report(&self, period: &ReportPeriod, today: NaiveDate) -> DbResult<SalesReport> {
        let (total_bills, total_orders) = self.lifetime_counts().await?;
        let day = self.period_totals(&ReportPeriod::day(today)).await?;
        let period_totals = self.period_totals(period).await?;
        let daily_revenue = self.daily_revenue(period).await?;
        let payment_mode_stats = self.payment_modes(period).await?;

        debug!(
            start = %period.start,
            end = %period.end,
            bills = period_totals.bills,
            "Built sales report"
        );

        Ok(SalesReport {
            summary: ReportSummary {
                total_bills,
                total_orders,
                today: DayStats {
                    revenue: day.revenue,
                    bills: day.bills,
                    average_bill: day.average_bill,
                },
                period: period_totals,
            },
            daily_revenue,
            payment_mode_stats,
        })
    }

    /// Paid orders and all orders, all time.
    pub async fn lifetime_counts(&self) -> DbResult<(u64, u64)> {
        let (paid, all): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'paid' THEN 1 ELSE 0 END), 0),
                COUNT(*)
            FROM orders
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((paid as u64, all as u64))
    }

    /// Revenue, bill count, discount and tax of Paid orders created in `period`.
    pub async fn period_totals(&self, period: &ReportPeriod) -> DbResult<PeriodStats> {
        let (start, end) = bounds(period);

        let row: TotalsRow = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(total), 0)      AS revenue,
                COUNT(*)                     AS bills,
                COALESCE(SUM(discount), 0)   AS discount,
                COALESCE(SUM(tax_amount), 0) AS tax
            FROM orders
            WHERE status = 'paid'
              AND created_at >= ?1
              AND created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let revenue = Money::from_units(row.revenue);
        let bills = row.bills as u64;

        Ok(PeriodStats {
            revenue,
            bills,
            average_bill: average_bill(revenue, bills),
            discount: Money::from_units(row.discount),
            tax: Money::from_units(row.tax),
        })
    }

    /// Revenue per day, ascending. Days without sales are omitted.
    pub async fn daily_revenue(&self, period: &ReportPeriod) -> DbResult<Vec<DailyRevenue>> {
        let (start, end) = bounds(period);

        let rows: Vec<DailyRow> = sqlx::query_as(
            r#"
            SELECT
                substr(created_at, 1, 10) AS day,
                COALESCE(SUM(total), 0)   AS revenue,
                COUNT(*)                  AS bills
            FROM orders
            WHERE status = 'paid'
              AND created_at >= ?1
              AND created_at < ?2
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| DailyRevenue {
                date: row.day,
                revenue: Money::from_units(row.revenue),
                bills: row.bills as u64,
            })
            .collect())
    }

    /// Paid orders per payment method, highest revenue first.
    pub async fn payment_modes(&self, period: &ReportPeriod) -> DbResult<Vec<PaymentModeStat>> {
        let (start, end) = bounds(period);

        let rows: Vec<PaymentRow> = sqlx::query_as(
            r#"
            SELECT
                payment_method,
                COUNT(*)                AS count,
                COALESCE(SUM(total), 0) AS revenue
            FROM orders
            WHERE status = 'paid'
              AND payment_method IS NOT NULL
              AND created_at >= ?1
              AND created_at < ?2
            GROUP BY payment_method
            ORDER BY revenue DESC, payment_method ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PaymentModeStat {
                payment_method: row.payment_method,
                count: row.count as u64,
                revenue: Money::from_units(row.revenue),
            })
            .collect())
    }
}

fn bounds(period: &ReportPeriod) -> (DateTime<Utc>, DateTime<Utc>) {
    (period.start_at(), period.end_exclusive())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;
    use dine_core::{BillCategory, LineItem, Order, OrderStatus};
    use uuid::Uuid;

    fn paid(table: &str, total: i64, discount: i64, tax: i64, method: PaymentMethod, at: DateTime<Utc>) -> Order {
        Order {
            id: Uuid::new_v4().to_string(),
            bill_number: Some(format!("BILL-{}", Uuid::new_v4().simple())),
            table_no: table.to_string(),
            items: vec![LineItem::new("Thali", Money::from_units(total), 1)],
            subtotal: Money::from_units(total),
            discount: Money::from_units(discount),
            tax_rate_bps: 0,
            tax_amount: Money::from_units(tax),
            total: Money::from_units(total),
            payment_method: Some(method),
            status: OrderStatus::Paid,
            bill_category: BillCategory::DineIn,
            customer_name: None,
            customer_phone: None,
            kitchen_notes: None,
            created_at: at,
            updated_at: at,
            version: 3,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let orders = db.orders();

        for order in [
            paid("T1", 220, 40, 20, PaymentMethod::Upi, at(2024, 3, 1, 12)),
            paid("T2", 100, 0, 0, PaymentMethod::Cash, at(2024, 3, 1, 23)),
            paid("T3", 300, 0, 30, PaymentMethod::Upi, at(2024, 3, 2, 9)),
            // Outside March
            paid("T4", 999, 0, 0, PaymentMethod::Card, at(2024, 4, 1, 0)),
        ] {
            orders.insert(&order).await.unwrap();
        }

        // Unpaid orders count toward totalOrders only.
        let mut open = paid("T5", 50, 0, 0, PaymentMethod::Cash, at(2024, 3, 2, 10));
        open.status = OrderStatus::Open;
        open.bill_number = None;
        open.payment_method = None;
        orders.insert(&open).await.unwrap();

        db
    }

    #[tokio::test]
    async fn test_period_totals() {
        let db = seeded().await;
        let march = ReportPeriod::month(2024, 3).unwrap();

        let totals = db.reports().period_totals(&march).await.unwrap();
        assert_eq!(totals.revenue.units(), 620);
        assert_eq!(totals.bills, 3);
        assert_eq!(totals.average_bill.units(), 207);
        assert_eq!(totals.discount.units(), 40);
        assert_eq!(totals.tax.units(), 50);
    }

    #[tokio::test]
    async fn test_daily_revenue_groups_by_utc_day() {
        let db = seeded().await;
        let march = ReportPeriod::month(2024, 3).unwrap();

        let days = db.reports().daily_revenue(&march).await.unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2024-03-01");
        assert_eq!(days[0].revenue.units(), 320);
        assert_eq!(days[0].bills, 2);
        assert_eq!(days[1].date, "2024-03-02");
    }

    #[tokio::test]
    async fn test_payment_modes() {
        let db = seeded().await;
        let march = ReportPeriod::month(2024, 3).unwrap();

        let modes = db.reports().payment_modes(&march).await.unwrap();
        assert_eq!(modes.len(), 2);
        assert_eq!(modes[0].payment_method, PaymentMethod::Upi);
        assert_eq!(modes[0].count, 2);
        assert_eq!(modes[0].revenue.units(), 520);
        assert_eq!(modes[1].payment_method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn test_sales_report_summary() {
        let db = seeded().await;
        let march = ReportPeriod::month(2024, 3).unwrap();

        let report = db.reports().sales_report(&march, date(2024, 3, 2)).await.unwrap();
        assert_eq!(report.summary.total_bills, 4);
        assert_eq!(report.summary.total_orders, 5);
        assert_eq!(report.summary.today.revenue.units(), 300);
        assert_eq!(report.summary.today.bills, 1);
        assert_eq!(report.summary.today.average_bill.units(), 300);
        assert_eq!(report.summary.period.bills, 3);
    }

    #[tokio::test]
    async fn test_empty_period() {
        let db = seeded().await;
        let empty = ReportPeriod::month(2023, 1).unwrap();

        let report = db.reports().sales_report(&empty, date(2023, 1, 15)).await.unwrap();
        assert_eq!(report.summary.period, PeriodStats::default());
        assert!(report.daily_revenue.is_empty());
        assert!(report.payment_mode_stats.is_empty());
    }
}
