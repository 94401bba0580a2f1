//! # Domain Types
//!
//! Core domain types used throughout Dine POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │    LineItem     │   │  OrderStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  name           │   │  Open           │       │
//! │  │  bill_number    │   │  price          │   │  Billed         │       │
//! │  │  table_no       │   │  quantity       │   │  Paid           │       │
//! │  │  items, totals  │   │  total          │   │  Cancelled      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ PaymentMethod   │   │  BillCategory   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Cash           │   │  Dine-In        │       │
//! │  │  1000 = 10%     │   │  UPI            │   │  Takeaway       │       │
//! │  └─────────────────┘   │  Card           │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every order has:
//! - `id`: UUID v4 - immutable, assigned at creation
//! - `bill_number`: human-readable, assigned exactly once when the order is billed

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10% and 250 bps = 2.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for request input).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of an order.
///
/// ```text
///   Open ──► Billed ──► Paid
///     │
///     └────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum OrderStatus {
    /// Items are still being added.
    Open,
    /// Bill number and final total assigned, awaiting payment.
    Billed,
    /// Payment recorded. Terminal.
    Paid,
    /// Administratively cancelled. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Open and Billed orders occupy their table.
    pub const fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::Billed)
    }

    /// Terminal states never change again.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// `allow_direct_settlement` admits the lenient Open → Paid edge.
    pub const fn can_transition_to(&self, next: OrderStatus, allow_direct_settlement: bool) -> bool {
        match (self, next) {
            (OrderStatus::Open, OrderStatus::Billed) => true,
            (OrderStatus::Open, OrderStatus::Cancelled) => true,
            (OrderStatus::Billed, OrderStatus::Paid) => true,
            (OrderStatus::Open, OrderStatus::Paid) => allow_direct_settlement,
            _ => false,
        }
    }

    /// Lowercase storage name, as written by the database layer.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Billed => "billed",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Open => "Open",
            OrderStatus::Billed => "Billed",
            OrderStatus::Paid => "Paid",
            OrderStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Unified Payments Interface transfer.
    #[serde(rename = "UPI")]
    Upi,
    /// Card payment on external terminal.
    Card,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Cash, PaymentMethod::Upi, PaymentMethod::Card];

    /// Display label, identical to the wire name.
    pub const fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Card => "Card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "upi" => Ok(PaymentMethod::Upi),
            "card" => Ok(PaymentMethod::Card),
            "" => Err(ValidationError::Required {
                field: "paymentMethod".to_string(),
            }),
            _ => Err(ValidationError::NotAllowed {
                field: "paymentMethod".to_string(),
                allowed: PaymentMethod::ALL.iter().map(|m| m.label().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Bill Category
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum BillCategory {
    #[serde(rename = "Dine-In")]
    DineIn,
    Takeaway,
}

impl Default for BillCategory {
    fn default() -> Self {
        BillCategory::DineIn
    }
}

impl FromStr for BillCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "dinein" => Ok(BillCategory::DineIn),
            "takeaway" => Ok(BillCategory::Takeaway),
            _ => Err(ValidationError::NotAllowed {
                field: "billType".to_string(),
                allowed: vec!["Dine-In".to_string(), "Takeaway".to_string()],
            }),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One line of an order. `total` is always `price × quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub name: String,
    /// Unit price.
    pub price: Money,
    pub quantity: i64,
    /// Line total (unit price × quantity).
    pub total: Money,
}

impl LineItem {
    /// Creates a line item, computing its total.
    pub fn new(name: impl Into<String>, price: Money, quantity: i64) -> Self {
        LineItem {
            name: name.into(),
            price,
            quantity,
            total: price.multiply_quantity(quantity),
        }
    }
}

// =============================================================================
// Customer Metadata
// =============================================================================

/// Optional details captured while an order is Open.
///
/// `None` means "not supplied"; saves keep the previous value in that case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderMetadata {
    pub bill_category: Option<BillCategory>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub kitchen_notes: Option<String>,
}

// =============================================================================
// Order
// =============================================================================

/// A table's order, from the first item through settlement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Assigned exactly once, when the order is billed.
    pub bill_number: Option<String>,
    pub table_no: String,
    pub items: Vec<LineItem>,
    /// Sum of `items[].total`.
    pub subtotal: Money,
    /// Absolute discount, set at bill generation.
    pub discount: Money,
    /// Tax rate in basis points, set at bill generation.
    pub tax_rate_bps: u32,
    /// Tax charged on `subtotal - discount`, after rounding.
    pub tax_amount: Money,
    /// Payable amount. Equals `subtotal` while Open.
    pub total: Money,
    pub payment_method: Option<PaymentMethod>,
    pub status: OrderStatus,
    pub bill_category: BillCategory,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub kitchen_notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Bumped on every write; at settlement this is the completion time.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, incremented on every write.
    pub version: i64,
}

impl Order {
    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination block returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_bills: u64,
    pub limit: u32,
}

impl Pagination {
    pub fn new(current_page: u32, limit: u32, total_bills: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total_bills.div_ceil(limit as u64) as u32;
        Pagination {
            current_page,
            total_pages,
            total_bills,
            limit,
        }
    }
}

/// A page of paid bills.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillPage {
    pub bills: Vec<Order>,
    pub pagination: Pagination,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(10.0).bps(), 1000);
        assert_eq!(TaxRate::from_percentage(2.5).bps(), 250);
        assert!((TaxRate::from_bps(1800).percentage() - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_state_machine_edges() {
        use OrderStatus::*;

        assert!(Open.can_transition_to(Billed, false));
        assert!(Billed.can_transition_to(Paid, false));
        assert!(Open.can_transition_to(Cancelled, false));

        assert!(!Open.can_transition_to(Paid, false));
        assert!(Open.can_transition_to(Paid, true));

        assert!(!Billed.can_transition_to(Billed, true));
        assert!(!Billed.can_transition_to(Open, true));
        assert!(!Billed.can_transition_to(Cancelled, true));
        for next in [Open, Billed, Paid, Cancelled] {
            assert!(!Paid.can_transition_to(next, true));
            assert!(!Cancelled.can_transition_to(next, true));
        }
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(" Card ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!(matches!(
            "cheque".parse::<PaymentMethod>(),
            Err(ValidationError::NotAllowed { .. })
        ));
        assert!(matches!(
            "".parse::<PaymentMethod>(),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Upi).unwrap(), "\"UPI\"");
        assert_eq!(serde_json::to_string(&BillCategory::DineIn).unwrap(), "\"Dine-In\"");
        assert_eq!(serde_json::to_string(&OrderStatus::Billed).unwrap(), "\"Billed\"");
    }

    #[test]
    fn test_bill_category_parsing() {
        assert_eq!("Dine-In".parse::<BillCategory>().unwrap(), BillCategory::DineIn);
        assert_eq!("dine_in".parse::<BillCategory>().unwrap(), BillCategory::DineIn);
        assert_eq!("Takeaway".parse::<BillCategory>().unwrap(), BillCategory::Takeaway);
        assert!("Delivery".parse::<BillCategory>().is_err());
    }

    #[test]
    fn test_line_item_total() {
        let item = LineItem::new("Burger", Money::from_units(100), 2);
        assert_eq!(item.total.units(), 200);
    }

    #[test]
    fn test_pagination_pages() {
        let p = Pagination::new(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
        assert_eq!(Pagination::new(2, 10, 20).total_pages, 2);
    }
}
