//! Order workflow service.
//!
//! Orchestrates the table order lifecycle over [`OrderRepository`]:
//!
//! ```text
//! save ──► Open ──generate_bill──► Billed ──settle──► Paid
//!           │
//!           └──cancel (admin)──► Cancelled
//! ```
//!
//! Every status change is a conditional UPDATE in the repository. When one
//! reports that nothing moved, the order is re-read to tell "gone" from
//! "already moved on". No in-process locks are held.
//!
//! [`OrderRepository`]: dine_db::OrderRepository

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use dine_core::bill_number::{parse_suffix, MAX_ALLOCATION_ATTEMPTS};
use dine_core::order::{BillInput, OrderDraft, SaveOrderInput, SettleInput};
use dine_core::validation::{validate_order_id, validate_paging, validate_search_query, validate_table_no};
use dine_core::{
    compute_bill, BillPage, BillTotals, CoreError, Order, OrderStatus, Pagination, TaxRate,
    DAILY_STATS_CACHE_PREFIX, OPEN_ORDERS_CACHE_KEY,
};
use dine_db::{BillUpdate, Database};

use crate::cache::{get_json, set_json, ReadCache};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult, ErrorCode};

/// Query for the bill history.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ListBillsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

/// Order workflow service.
#[derive(Clone)]
pub struct OrderService {
    db: Database,
    cache: Arc<dyn ReadCache>,
    config: Arc<ApiConfig>,
}

impl OrderService {
    pub fn new(db: Database, cache: Arc<dyn ReadCache>, config: Arc<ApiConfig>) -> Self {
        OrderService { db, cache, config }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The Open or Billed order on `table_no`, if any.
    pub async fn active_for_table(&self, table_no: &str) -> ApiResult<Option<Order>> {
        let table_no = validate_table_no(table_no)?;
        let order = self.db.orders().find_active_for_table(&table_no).await?;
        debug!(table_no = %table_no, found = order.is_some(), "Looked up active order");
        Ok(order)
    }

    /// Open and Billed orders, newest activity first. Cached briefly.
    pub async fn list_open(&self) -> ApiResult<Vec<Order>> {
        if let Some(orders) = get_json::<Vec<Order>>(self.cache.as_ref(), OPEN_ORDERS_CACHE_KEY) {
            debug!(count = orders.len(), "Open orders served from cache");
            return Ok(orders);
        }

        let orders = self.db.orders().list_active().await?;
        set_json(
            self.cache.as_ref(),
            OPEN_ORDERS_CACHE_KEY,
            &orders,
            self.config.open_orders_ttl(),
        );
        Ok(orders)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Order> {
        validate_order_id(id)?;
        self.fetch(id).await
    }

    /// Paid bills by settlement time, newest first.
    pub async fn list_bills(&self, query: &ListBillsQuery) -> ApiResult<BillPage> {
        let (page, limit) = validate_paging(query.page, query.limit)?;
        let search = validate_search_query(query.search.as_deref())?;

        let (bills, total) = self.db.orders().list_paid(search.as_deref(), page, limit).await?;

        Ok(BillPage {
            bills,
            pagination: Pagination::new(page, limit, total),
        })
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Creates the table's Open order or replaces the items of the existing one.
    pub async fn save(&self, input: SaveOrderInput) -> ApiResult<Order> {
        let draft = input.validate()?;
        let repo = self.db.orders();

        let order = match repo.find_active_for_table(&draft.table_no).await? {
            Some(existing) => self.update_existing(existing, &draft).await?,
            None => match repo.insert_open(&draft).await {
                Ok(order) => {
                    info!(
                        order_id = %order.id,
                        table_no = %order.table_no,
                        subtotal = %order.subtotal,
                        "Opened order"
                    );
                    order
                }
                Err(e) if e.is_unique_violation_on("table_no") => {
                    // Another terminal opened this table first; continue on its order
                    warn!(table_no = %draft.table_no, "Table opened concurrently, merging into existing order");
                    let existing = repo
                        .find_active_for_table(&draft.table_no)
                        .await?
                        .ok_or_else(|| {
                            ApiError::new(
                                ErrorCode::Conflict,
                                format!("Table {} changed while saving, retry", draft.table_no),
                            )
                        })?;
                    self.update_existing(existing, &draft).await?
                }
                Err(e) => return Err(e.into()),
            },
        };

        self.invalidate();
        Ok(order)
    }

    async fn update_existing(&self, existing: Order, draft: &OrderDraft) -> ApiResult<Order> {
        if existing.status == OrderStatus::Billed {
            return Err(CoreError::TableHasBilledOrder {
                table_no: existing.table_no,
            }
            .into());
        }

        if !self.db.orders().update_open(&existing.id, draft).await? {
            return Err(self.refusal(&existing.id, "update items").await);
        }

        let order = self.fetch(&existing.id).await?;
        info!(
            order_id = %order.id,
            table_no = %order.table_no,
            items = order.items.len(),
            subtotal = %order.subtotal,
            "Updated order"
        );
        Ok(order)
    }

    /// Open → Billed: fixes discount, tax and total and assigns a bill number.
    pub async fn generate_bill(&self, id: &str, input: BillInput) -> ApiResult<Order> {
        validate_order_id(id)?;
        let order = self.fetch(id).await?;

        if !order.status.can_transition_to(OrderStatus::Billed, false) {
            return Err(CoreError::InvalidOrderStatus {
                order_id: order.id,
                current_status: order.status,
                operation: "generate bill",
            }
            .into());
        }

        let terms = input.validate(order.subtotal)?;
        let bill = compute_bill(order.subtotal, terms.discount, terms.tax_rate);

        let highest = self
            .db
            .orders()
            .highest_bill_number()
            .await?
            .as_deref()
            .and_then(parse_suffix);
        let first = self
            .config
            .bill_numbering
            .first_candidate(highest, Utc::now().timestamp_millis());

        let billed = self
            .apply_bill_from(&order, first, &bill, terms.tax_rate)
            .await?;
        self.invalidate();
        Ok(billed)
    }

    /// Tries `first`, `first + 1`, ... until one is free or the attempts run out.
    ///
    /// `bill` must have been computed from `order` as read; the write is
    /// refused if the order has been saved since.
    async fn apply_bill_from(
        &self,
        order: &Order,
        first: u64,
        bill: &BillTotals,
        tax_rate: TaxRate,
    ) -> ApiResult<Order> {
        let repo = self.db.orders();
        let strategy = self.config.bill_numbering;
        let id = order.id.as_str();
        let mut candidate = first;

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let update = BillUpdate {
                expected_version: order.version,
                bill_number: strategy.format(candidate),
                discount: bill.discount,
                tax_rate,
                tax_amount: bill.tax_amount,
                total: bill.total,
                billed_at: Utc::now(),
            };

            match repo.apply_bill(id, &update).await {
                Ok(true) => {
                    info!(
                        order_id = %id,
                        bill_number = %update.bill_number,
                        total = %update.total,
                        attempt,
                        "Generated bill"
                    );
                    return self.fetch(id).await;
                }
                Ok(false) => return Err(self.billing_refusal(order).await),
                Err(e) if e.is_unique_violation_on("bill_number") => {
                    warn!(
                        order_id = %id,
                        bill_number = %update.bill_number,
                        attempt,
                        "Bill number taken, trying the next one"
                    );
                    candidate += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(order_id = %id, attempts = MAX_ALLOCATION_ATTEMPTS, "Bill number allocation exhausted");
        Err(CoreError::BillNumberExhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        }
        .into())
    }

    /// Billed → Paid, or Open → Paid when direct settlement is enabled.
    pub async fn settle(&self, id: &str, input: SettleInput) -> ApiResult<Order> {
        validate_order_id(id)?;
        let payment_method = input.validate()?;
        let allow_direct = self.config.allow_direct_settlement;

        let settled = self
            .db
            .orders()
            .settle(id, payment_method, Utc::now(), allow_direct)
            .await?;

        if !settled {
            return Err(self.refusal(id, "settle").await);
        }

        let order = self.fetch(id).await?;
        info!(
            order_id = %order.id,
            bill_number = ?order.bill_number,
            payment_method = %payment_method,
            total = %order.total,
            "Settled bill"
        );

        self.invalidate();
        Ok(order)
    }

    /// Open → Cancelled.
    pub async fn cancel(&self, id: &str) -> ApiResult<Order> {
        validate_order_id(id)?;

        if !self.db.orders().cancel(id, Utc::now()).await? {
            return Err(self.refusal(id, "cancel").await);
        }

        let order = self.fetch(id).await?;
        info!(order_id = %order.id, table_no = %order.table_no, "Cancelled order");

        self.invalidate();
        Ok(order)
    }

    /// Removes an order in any status.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        validate_order_id(id)?;

        if !self.db.orders().delete(id).await? {
            return Err(CoreError::OrderNotFound(id.to_string()).into());
        }

        info!(order_id = %id, "Deleted order");
        self.invalidate();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn fetch(&self, id: &str) -> ApiResult<Order> {
        self.db
            .orders()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
    }

    /// Explains why a conditional update on `id` changed nothing.
    async fn refusal(&self, id: &str, operation: &'static str) -> ApiError {
        match self.db.orders().get_by_id(id).await {
            Ok(Some(order)) => CoreError::InvalidOrderStatus {
                order_id: order.id,
                current_status: order.status,
                operation,
            }
            .into(),
            Ok(None) => CoreError::OrderNotFound(id.to_string()).into(),
            Err(e) => e.into(),
        }
    }

    /// Like [`Self::refusal`], but an order still Open was saved mid-billing.
    async fn billing_refusal(&self, order: &Order) -> ApiError {
        match self.db.orders().get_by_id(&order.id).await {
            Ok(Some(current)) if current.status == OrderStatus::Open => {
                warn!(
                    order_id = %order.id,
                    read_version = order.version,
                    current_version = current.version,
                    "Order saved while billing"
                );
                CoreError::OrderChanged {
                    order_id: order.id.clone(),
                }
                .into()
            }
            _ => self.refusal(&order.id, "generate bill").await,
        }
    }

    fn invalidate(&self) {
        self.cache.clear(OPEN_ORDERS_CACHE_KEY);
        self.cache.clear(DAILY_STATS_CACHE_PREFIX);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use dine_core::order::LineItemInput;
    use dine_core::validation::LooseNumber;
    use dine_core::{NumberingStrategy, PaymentMethod, MAX_ORDER_SUBTOTAL, MAX_UNIT_PRICE};
    use dine_db::DbConfig;
    use serde_json::json;
    use std::time::Duration;
    use uuid::Uuid;

    async fn service_with(config: ApiConfig) -> (OrderService, Arc<MemoryCache>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cache = Arc::new(MemoryCache::new());
        let service = OrderService::new(db, cache.clone(), Arc::new(config));
        (service, cache)
    }

    async fn service() -> OrderService {
        service_with(ApiConfig::default()).await.0
    }

    fn burger_and_coke(table: &str) -> SaveOrderInput {
        SaveOrderInput {
            table_no: table.to_string(),
            items: vec![
                LineItemInput::new("Burger", 100, 2),
                LineItemInput::new("Coke", 40, 1),
            ],
            ..Default::default()
        }
    }

    fn cash() -> SettleInput {
        SettleInput {
            payment_method: Some("Cash".to_string()),
        }
    }

    #[tokio::test]
    async fn test_save_creates_open_order() {
        let service = service().await;

        let order = service.save(burger_and_coke("T1")).await.unwrap();

        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.subtotal.units(), 240);
        assert_eq!(order.total.units(), 240);
        assert!(order.bill_number.is_none());
    }

    #[tokio::test]
    async fn test_save_updates_existing_open_order() {
        let service = service().await;
        let first = service.save(burger_and_coke("T1")).await.unwrap();

        let mut input = burger_and_coke("T1");
        input.items.push(LineItemInput::new("Fries", 60, 1));
        input.customer_name = Some("Asha".to_string());
        let second = service.save(input).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.items.len(), 3);
        assert_eq!(second.subtotal.units(), 300);
        assert_eq!(second.customer_name.as_deref(), Some("Asha"));

        // Omitted metadata keeps the stored value
        let third = service.save(burger_and_coke("T1")).await.unwrap();
        assert_eq!(third.customer_name.as_deref(), Some("Asha"));
    }

    #[tokio::test]
    async fn test_save_with_empty_items_rejected() {
        let service = service().await;
        let open = service.save(burger_and_coke("T1")).await.unwrap();

        let mut input = burger_and_coke("T1");
        input.items.clear();
        let err = service.save(input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let unchanged = service.get(&open.id).await.unwrap();
        assert_eq!(unchanged.items.len(), 2);
        assert_eq!(unchanged.version, open.version);
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_price() {
        let service = service().await;
        let mut input = burger_and_coke("T1");
        input.items[0].price = Some(LooseNumber::Float(1e15));

        let err = service.save(input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut input = burger_and_coke("T1");
        input.items[0] = LineItemInput::new("Banquet", i64::MAX / 2, 3);
        let err = service.save(input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(service.active_for_table("T1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bill_largest_order_at_full_tax() {
        let service = service().await;
        let input = SaveOrderInput {
            table_no: "T1".to_string(),
            items: vec![LineItemInput::new("Banquet", MAX_UNIT_PRICE, 100)],
            ..Default::default()
        };
        let order = service.save(input).await.unwrap();
        assert_eq!(order.subtotal.units(), MAX_ORDER_SUBTOTAL);

        let billed = service
            .generate_bill(&order.id, BillInput::new(0, 100.0))
            .await
            .unwrap();
        assert_eq!(billed.total.units(), MAX_ORDER_SUBTOTAL * 2);
    }

    #[tokio::test]
    async fn test_paid_and_cancelled_orders_keep_their_items() {
        let service = service().await;

        let paid = service.save(burger_and_coke("T1")).await.unwrap();
        service.generate_bill(&paid.id, BillInput::new(40, 10.0)).await.unwrap();
        let paid = service.settle(&paid.id, cash()).await.unwrap();

        let cancelled = service.save(burger_and_coke("T2")).await.unwrap();
        let cancelled = service.cancel(&cancelled.id).await.unwrap();

        for (table, before) in [("T1", &paid), ("T2", &cancelled)] {
            let input = SaveOrderInput {
                table_no: table.to_string(),
                items: vec![LineItemInput::new("Tea", 10, 1)],
                ..Default::default()
            };
            let next = service.save(input).await.unwrap();
            assert_ne!(next.id, before.id);
            assert_eq!(next.subtotal.units(), 10);

            let after = service.get(&before.id).await.unwrap();
            assert_eq!(after.status, before.status);
            assert_eq!(after.items, before.items);
            assert_eq!(after.subtotal, before.subtotal);
            assert_eq!(after.total, before.total);
            assert_eq!(after.version, before.version);
        }
    }

    #[tokio::test]
    async fn test_save_on_billed_table_conflicts() {
        let service = service().await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();
        service.generate_bill(&order.id, BillInput::new(0, 0.0)).await.unwrap();

        let err = service.save(burger_and_coke("T1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_generate_bill() {
        let service = service().await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();

        let billed = service
            .generate_bill(&order.id, BillInput::new(40, 10.0))
            .await
            .unwrap();

        assert_eq!(billed.status, OrderStatus::Billed);
        assert_eq!(billed.bill_number.as_deref(), Some("BILL-0001"));
        assert_eq!(billed.discount.units(), 40);
        assert_eq!(billed.tax_amount.units(), 20);
        assert_eq!(billed.total.units(), 220);
        assert_eq!(billed.tax_rate().bps(), 1000);
    }

    #[tokio::test]
    async fn test_bill_numbers_are_sequential() {
        let service = service().await;

        for (n, table) in ["T1", "T2", "T3"].iter().enumerate() {
            let order = service.save(burger_and_coke(table)).await.unwrap();
            let billed = service.generate_bill(&order.id, BillInput::default()).await.unwrap();
            assert_eq!(billed.bill_number, Some(format!("BILL-{:04}", n + 1)));
        }
    }

    #[tokio::test]
    async fn test_generate_bill_twice_conflicts() {
        let service = service().await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();
        let billed = service.generate_bill(&order.id, BillInput::new(40, 10.0)).await.unwrap();

        let err = service
            .generate_bill(&order.id, BillInput::new(0, 0.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let after = service.get(&order.id).await.unwrap();
        assert_eq!(after.bill_number, billed.bill_number);
        assert_eq!(after.total, billed.total);
        assert_eq!(after.version, billed.version);
    }

    #[tokio::test]
    async fn test_generate_bill_unknown_order() {
        let service = service().await;
        let err = service
            .generate_bill(&Uuid::new_v4().to_string(), BillInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_generate_bill_rejects_discount_over_subtotal() {
        let service = service().await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();

        let err = service
            .generate_bill(&order.id, BillInput::new(500, 0.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(service.get(&order.id).await.unwrap().status, OrderStatus::Open);
    }

    #[tokio::test]
    async fn test_save_between_read_and_bill_conflicts() {
        let service = service().await;
        let read = service.save(burger_and_coke("T1")).await.unwrap();
        let terms = BillInput::new(40, 10.0).validate(read.subtotal).unwrap();
        let bill = compute_bill(read.subtotal, terms.discount, terms.tax_rate);

        // Another terminal replaces the items before the bill is written
        let mut tea = burger_and_coke("T1");
        tea.items = vec![LineItemInput::new("Tea", 10, 1)];
        service.save(tea).await.unwrap();

        let err = service
            .apply_bill_from(&read, 1, &bill, terms.tax_rate)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let current = service.get(&read.id).await.unwrap();
        assert_eq!(current.status, OrderStatus::Open);
        assert_eq!(current.subtotal.units(), 10);
        assert!(current.bill_number.is_none());

        // Billing from a fresh read goes through with the new figures
        let billed = service
            .generate_bill(&read.id, BillInput::new(0, 10.0))
            .await
            .unwrap();
        assert_eq!(billed.subtotal.units(), 10);
        assert_eq!(billed.total.units(), 11);
        assert_eq!(billed.bill_number.as_deref(), Some("BILL-0001"));
    }

    #[tokio::test]
    async fn test_allocation_skips_taken_numbers() {
        let service = service().await;
        for table in ["T1", "T2", "T3"] {
            let order = service.save(burger_and_coke(table)).await.unwrap();
            service.generate_bill(&order.id, BillInput::default()).await.unwrap();
        }

        // Start from a stale candidate as a racing terminal would
        let order = service.save(burger_and_coke("T4")).await.unwrap();
        let bill = compute_bill(order.subtotal, order.discount, TaxRate::zero());
        let billed = service
            .apply_bill_from(&order, 2, &bill, TaxRate::zero())
            .await
            .unwrap();

        assert_eq!(billed.bill_number.as_deref(), Some("BILL-0004"));
    }

    #[tokio::test]
    async fn test_allocation_exhausted_after_five_attempts() {
        let service = service().await;
        for n in 0..5 {
            let order = service.save(burger_and_coke(&format!("T{}", n))).await.unwrap();
            service.generate_bill(&order.id, BillInput::default()).await.unwrap();
        }

        let order = service.save(burger_and_coke("T9")).await.unwrap();
        let bill = compute_bill(order.subtotal, order.discount, TaxRate::zero());
        let err = service
            .apply_bill_from(&order, 1, &bill, TaxRate::zero())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::AllocationExhausted);
        let after = service.get(&order.id).await.unwrap();
        assert_eq!(after.status, OrderStatus::Open);
        assert!(after.bill_number.is_none());
    }

    #[tokio::test]
    async fn test_timestamp_numbering() {
        let config = ApiConfig {
            bill_numbering: NumberingStrategy::Timestamp,
            ..ApiConfig::default()
        };
        let (service, _) = service_with(config).await;
        let before = Utc::now().timestamp_millis() as u64;

        let order = service.save(burger_and_coke("T1")).await.unwrap();
        let billed = service.generate_bill(&order.id, BillInput::default()).await.unwrap();

        let number = billed.bill_number.as_deref().and_then(parse_suffix).unwrap();
        assert!(number >= before);
    }

    #[tokio::test]
    async fn test_settle_billed_order() {
        let service = service().await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();
        let billed = service.generate_bill(&order.id, BillInput::new(40, 10.0)).await.unwrap();

        let paid = service
            .settle(
                &order.id,
                SettleInput {
                    payment_method: Some("UPI".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.payment_method, Some(PaymentMethod::Upi));
        assert_eq!(paid.total.units(), 220);
        assert!(paid.updated_at >= billed.updated_at);

        // The table is free again
        assert!(service.active_for_table("T1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settle_open_order_requires_bill_by_default() {
        let service = service().await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();

        let err = service.settle(&order.id, cash()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_direct_settlement_when_enabled() {
        let config = ApiConfig {
            allow_direct_settlement: true,
            ..ApiConfig::default()
        };
        let (service, _) = service_with(config).await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();

        let paid = service.settle(&order.id, cash()).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert!(paid.bill_number.is_none());

        // Still no second settlement
        let err = service.settle(&order.id, cash()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_settle_invalid_payment_method() {
        let service = service().await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();
        service.generate_bill(&order.id, BillInput::default()).await.unwrap();

        let err = service
            .settle(
                &order.id,
                SettleInput {
                    payment_method: Some("Cheque".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_settle_unknown_order() {
        let service = service().await;
        let err = service
            .settle(&Uuid::new_v4().to_string(), cash())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_cancel() {
        let service = service().await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();

        let cancelled = service.cancel(&order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let err = service.cancel(&order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        // A new order can open on the table
        let next = service.save(burger_and_coke("T1")).await.unwrap();
        assert_ne!(next.id, order.id);
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service().await;
        let order = service.save(burger_and_coke("T1")).await.unwrap();

        service.delete(&order.id).await.unwrap();
        assert_eq!(service.get(&order.id).await.unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(service.delete(&order.id).await.unwrap_err().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_list_bills_only_paid() {
        let service = service().await;
        for table in ["T1", "T2", "T3"] {
            let order = service.save(burger_and_coke(table)).await.unwrap();
            service.generate_bill(&order.id, BillInput::default()).await.unwrap();
            if table != "T3" {
                service.settle(&order.id, cash()).await.unwrap();
            }
        }

        let page = service.list_bills(&ListBillsQuery::default()).await.unwrap();
        assert_eq!(page.bills.len(), 2);
        assert_eq!(page.pagination.total_bills, 2);
        assert_eq!(page.pagination.current_page, 1);
        // Most recently settled first
        assert_eq!(page.bills[0].table_no, "T2");

        let searched = service
            .list_bills(&ListBillsQuery {
                search: Some("bill-0001".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.bills.len(), 1);
        assert_eq!(searched.bills[0].table_no, "T1");
    }

    #[tokio::test]
    async fn test_mutations_invalidate_cache() {
        let (service, cache) = service_with(ApiConfig::default()).await;
        cache.set("dailyStats:2024-03-01:2024-03-31", json!({}), Duration::from_secs(30));

        assert!(service.list_open().await.unwrap().is_empty());
        assert!(cache.get(OPEN_ORDERS_CACHE_KEY).is_some());

        service.save(burger_and_coke("T1")).await.unwrap();
        assert!(cache.is_empty());

        let open = service.list_open().await.unwrap();
        assert_eq!(open.len(), 1);
    }

    #[tokio::test]
    async fn test_list_open_serves_cached_copy() {
        let (service, cache) = service_with(ApiConfig::default()).await;
        service.save(burger_and_coke("T1")).await.unwrap();
        assert_eq!(service.list_open().await.unwrap().len(), 1);

        // Written behind the service's back: still within the TTL, so stale
        service
            .db
            .orders()
            .insert_open(&burger_and_coke("T2").validate().unwrap())
            .await
            .unwrap();
        assert_eq!(service.list_open().await.unwrap().len(), 1);

        cache.clear(OPEN_ORDERS_CACHE_KEY);
        assert_eq!(service.list_open().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_two_tables_billed_at_once_both_succeed() {
        let path = std::env::temp_dir().join(format!("dine-api-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        let service = OrderService::new(
            db.clone(),
            Arc::new(MemoryCache::new()),
            Arc::new(ApiConfig::default()),
        );
        let t1 = service.save(burger_and_coke("T1")).await.unwrap().id;
        let t2 = service.save(burger_and_coke("T2")).await.unwrap().id;

        let (a, b) = tokio::join!(
            service.generate_bill(&t1, BillInput::default()),
            service.generate_bill(&t2, BillInput::default()),
        );

        let mut numbers = vec![
            a.unwrap().bill_number.unwrap(),
            b.unwrap().bill_number.unwrap(),
        ];
        numbers.sort();
        assert_eq!(numbers, ["BILL-0001", "BILL-0002"]);

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_concurrent_bills_get_distinct_numbers() {
        let path = std::env::temp_dir().join(format!("dine-api-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        let service = OrderService::new(
            db.clone(),
            Arc::new(MemoryCache::new()),
            Arc::new(ApiConfig::default()),
        );

        let mut ids = Vec::new();
        for n in 0..6 {
            ids.push(service.save(burger_and_coke(&format!("T{}", n))).await.unwrap().id);
        }

        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let service = service.clone();
                tokio::spawn(async move { service.generate_bill(&id, BillInput::default()).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            // With 6 racers a late one can exhaust its 5 attempts
            if let Ok(order) = handle.await.unwrap() {
                numbers.push(order.bill_number.unwrap());
            }
        }

        assert!(!numbers.is_empty());
        let mut unique = numbers.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), numbers.len());

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_concurrent_generate_same_order_bills_once() {
        let path = std::env::temp_dir().join(format!("dine-api-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        let service = OrderService::new(
            db.clone(),
            Arc::new(MemoryCache::new()),
            Arc::new(ApiConfig::default()),
        );
        let id = service.save(burger_and_coke("T1")).await.unwrap().id;

        let (a, b) = tokio::join!(
            service.generate_bill(&id, BillInput::default()),
            service.generate_bill(&id, BillInput::default()),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert_eq!(failure.code, ErrorCode::Conflict);

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
