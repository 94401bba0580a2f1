//! # Order Repository
//!
//! Database operations for orders.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── insert_open()  → Order { status: Open }                        │
//! │     └── update_open()  → items replaced, subtotal recomputed           │
//! │                                                                         │
//! │  2. BILL                                                               │
//! │     └── apply_bill()   → WHERE status = 'open' AND version = expected  │
//! │         UNIQUE(bill_number) may reject → caller retries                │
//! │                                                                         │
//! │  3. SETTLE                                                             │
//! │     └── settle()       → WHERE status = 'billed'                       │
//! │                          updated_at = settlement time                  │
//! │                                                                         │
//! │  (ADMIN) cancel() WHERE status = 'open', delete()                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dine_core::order::OrderDraft;
use dine_core::{BillCategory, LineItem, Money, Order, OrderStatus, PaymentMethod, TaxRate};

/// Columns selected for every order read, in [`OrderRow`] order.
const ORDER_COLUMNS: &str = "id, bill_number, table_no, items, subtotal, discount, tax_rate_bps, \
     tax_amount, total, payment_method, status, bill_category, customer_name, customer_phone, \
     kitchen_notes, created_at, updated_at, version";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    bill_number: Option<String>,
    table_no: String,
    items: String,
    subtotal: i64,
    discount: i64,
    tax_rate_bps: i64,
    tax_amount: i64,
    total: i64,
    payment_method: Option<PaymentMethod>,
    status: OrderStatus,
    bill_category: BillCategory,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    kitchen_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        let items: Vec<LineItem> = serde_json::from_str(&row.items)?;
        let tax_rate_bps = u32::try_from(row.tax_rate_bps)
            .map_err(|_| DbError::Corrupt(format!("order {}: tax_rate_bps out of range", row.id)))?;

        Ok(Order {
            id: row.id,
            bill_number: row.bill_number,
            table_no: row.table_no,
            items,
            subtotal: Money::from_units(row.subtotal),
            discount: Money::from_units(row.discount),
            tax_rate_bps,
            tax_amount: Money::from_units(row.tax_amount),
            total: Money::from_units(row.total),
            payment_method: row.payment_method,
            status: row.status,
            bill_category: row.bill_category,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            kitchen_notes: row.kitchen_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

/// Escapes LIKE wildcards and wraps the term for substring matching.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// =============================================================================
// Bill Update
// =============================================================================

/// Values written when an order is billed.
///
/// `expected_version` is the version the figures were computed from; the
/// update is refused if the order has been saved since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillUpdate {
    pub expected_version: i64,
    pub bill_number: String,
    pub discount: Money,
    pub tax_rate: TaxRate,
    pub tax_amount: Money,
    pub total: Money,
    pub billed_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = OrderRepository::new(pool);
///
/// let order = repo.insert_open(&draft).await?;
/// let moved = repo.apply_bill(&order.id, &update).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets an order by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Order))` - Order found
    /// * `Ok(None)` - Order not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Finds the Open or Billed order occupying a table, if any.
    pub async fn find_active_for_table(&self, table_no: &str) -> DbResult<Option<Order>> {
        let sql = format!(
            "SELECT {} FROM orders WHERE table_no = ?1 AND status IN ('open', 'billed') \
             ORDER BY created_at DESC LIMIT 1",
            ORDER_COLUMNS
        );

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(table_no)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Lists every Open or Billed order, most recently touched first.
    pub async fn list_active(&self) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM orders WHERE status IN ('open', 'billed') \
             ORDER BY updated_at DESC, id DESC",
            ORDER_COLUMNS
        );

        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed active orders");
        into_orders(rows)
    }

    /// Lists Paid orders by settlement time, newest first.
    ///
    /// `search` matches bill number, table or customer name as a
    /// case-insensitive substring.
    ///
    /// ## Returns
    /// The requested page and the total number of matching orders.
    pub async fn list_paid(
        &self,
        search: Option<&str>,
        page: u32,
        limit: u32,
    ) -> DbResult<(Vec<Order>, u64)> {
        const FILTER: &str = r#"
            status = 'paid'
            AND (
                ?1 IS NULL
                OR bill_number LIKE ?1 ESCAPE '\'
                OR table_no LIKE ?1 ESCAPE '\'
                OR customer_name LIKE ?1 ESCAPE '\'
            )
        "#;

        let pattern = search.map(like_pattern);
        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders WHERE {}", FILTER))
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM orders WHERE {} ORDER BY updated_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            ORDER_COLUMNS, FILTER
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(pattern.as_deref())
            .bind(i64::from(limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        debug!(search = ?search, page, limit, total, "Listed paid orders");
        Ok((into_orders(rows)?, total as u64))
    }

    /// Returns the largest bill number in use.
    ///
    /// Longer numbers sort first so `BILL-10000` beats `BILL-9999`.
    pub async fn highest_bill_number(&self) -> DbResult<Option<String>> {
        let highest: Option<String> = sqlx::query_scalar(
            r#"
            SELECT bill_number
            FROM orders
            WHERE bill_number IS NOT NULL
            ORDER BY LENGTH(bill_number) DESC, bill_number DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(highest)
    }

    /// Counts orders in any status.
    pub async fn count_all(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Inserts a complete order row.
    ///
    /// ## Errors
    /// * `UniqueViolation` on `orders.table_no` - the table already has an
    ///   active order
    /// * `UniqueViolation` on `orders.bill_number` - number already used
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        let items = serde_json::to_string(&order.items)?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, bill_number, table_no, items, subtotal, discount, tax_rate_bps,
                tax_amount, total, payment_method, status, bill_category,
                customer_name, customer_phone, kitchen_notes,
                created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
        )
        .bind(&order.id)
        .bind(&order.bill_number)
        .bind(&order.table_no)
        .bind(items)
        .bind(order.subtotal.units())
        .bind(order.discount.units())
        .bind(i64::from(order.tax_rate_bps))
        .bind(order.tax_amount.units())
        .bind(order.total.units())
        .bind(order.payment_method)
        .bind(order.status)
        .bind(order.bill_category)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.kitchen_notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.version)
        .execute(&self.pool)
        .await?;

        debug!(order_id = %order.id, table_no = %order.table_no, status = %order.status, "Inserted order");
        Ok(())
    }

    /// Opens a new order for a table from a validated draft.
    ///
    /// `total` starts equal to `subtotal`; discount and tax wait for billing.
    pub async fn insert_open(&self, draft: &OrderDraft) -> DbResult<Order> {
        let now = Utc::now();

        let order = Order {
            id: Uuid::new_v4().to_string(),
            bill_number: None,
            table_no: draft.table_no.clone(),
            items: draft.items.clone(),
            subtotal: draft.subtotal,
            discount: Money::zero(),
            tax_rate_bps: 0,
            tax_amount: Money::zero(),
            total: draft.subtotal,
            payment_method: None,
            status: OrderStatus::Open,
            bill_category: draft.metadata.bill_category.unwrap_or_default(),
            customer_name: draft.metadata.customer_name.clone(),
            customer_phone: draft.metadata.customer_phone.clone(),
            kitchen_notes: draft.metadata.kitchen_notes.clone(),
            created_at: now,
            updated_at: now,
            version: 1,
        };

        self.insert(&order).await?;
        Ok(order)
    }

    /// Replaces the items of an Open order and recomputes its subtotal.
    ///
    /// Metadata left as `None` in the draft keeps its stored value.
    ///
    /// ## Returns
    /// `false` when the order no longer exists or is no longer Open.
    pub async fn update_open(&self, id: &str, draft: &OrderDraft) -> DbResult<bool> {
        let items = serde_json::to_string(&draft.items)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                items = ?2,
                subtotal = ?3,
                total = ?3,
                bill_category = COALESCE(?4, bill_category),
                customer_name = COALESCE(?5, customer_name),
                customer_phone = COALESCE(?6, customer_phone),
                kitchen_notes = COALESCE(?7, kitchen_notes),
                updated_at = ?8,
                version = version + 1
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(items)
        .bind(draft.subtotal.units())
        .bind(draft.metadata.bill_category)
        .bind(&draft.metadata.customer_name)
        .bind(&draft.metadata.customer_phone)
        .bind(&draft.metadata.kitchen_notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Moves an Open order to Billed with its bill number and final figures.
    ///
    /// ## Returns
    /// * `Ok(true)` - the order was Open at `expected_version` and is now Billed
    /// * `Ok(false)` - the order is missing, not Open, or was saved since the
    ///   figures were computed; nothing changed
    ///
    /// ## Errors
    /// * `UniqueViolation` on `orders.bill_number` - another order holds the number
    pub async fn apply_bill(&self, id: &str, update: &BillUpdate) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'billed',
                bill_number = ?2,
                discount = ?3,
                tax_rate_bps = ?4,
                tax_amount = ?5,
                total = ?6,
                updated_at = ?7,
                version = version + 1
            WHERE id = ?1 AND status = 'open' AND version = ?8
            "#,
        )
        .bind(id)
        .bind(&update.bill_number)
        .bind(update.discount.units())
        .bind(i64::from(update.tax_rate.bps()))
        .bind(update.tax_amount.units())
        .bind(update.total.units())
        .bind(update.billed_at)
        .bind(update.expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Marks a Billed order Paid, stamping `updated_at` with the settlement time.
    ///
    /// With `allow_from_open`, an Open order may be settled directly.
    ///
    /// ## Returns
    /// `false` when the order is missing or not in a settleable status.
    pub async fn settle(
        &self,
        id: &str,
        payment_method: PaymentMethod,
        settled_at: DateTime<Utc>,
        allow_from_open: bool,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'paid',
                payment_method = ?2,
                updated_at = ?3,
                version = version + 1
            WHERE id = ?1
              AND (status = 'billed' OR (?4 AND status = 'open'))
            "#,
        )
        .bind(id)
        .bind(payment_method)
        .bind(settled_at)
        .bind(allow_from_open)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Cancels an Open order.
    ///
    /// ## Returns
    /// `false` when the order is missing or not Open.
    pub async fn cancel(&self, id: &str, cancelled_at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'cancelled',
                updated_at = ?2,
                version = version + 1
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(cancelled_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes an order in any status.
    ///
    /// ## Returns
    /// `false` when no order had this id.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Tests
// =============================================================================
