//! # dine-core: Pure Order-to-Bill Logic for Dine POS
//!
//! This crate holds the restaurant billing rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dine POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web client                                   │   │
//! │  │    Tables ──► Order ──► Bill ──► Payment ──► History            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    billing-api (axum)                           │   │
//! │  │    save, generate, settle, cancel, list, analytics              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dine-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  billing  │  │bill_number│  │ validation│  │   │
//! │  │   │   Order   │  │ discount  │  │ BILL-0001 │  │   rules   │  │   │
//! │  │   │  status   │  │    tax    │  │  strategy │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    dine-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Order, line items, status state machine
//! - [`money`] - Whole-unit money type
//! - [`billing`] - Discount/tax/total calculator
//! - [`bill_number`] - Bill number formatting and candidate generation
//! - [`order`] - Request inputs and their validation
//! - [`analytics`] - Report periods and report shapes
//! - [`catalog`] - Menu items, categories and their inputs
//! - [`account`] - Staff roles and login credentials
//! - [`validation`] - Field-level rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use dine_core::billing::compute_bill;
//! use dine_core::{Money, TaxRate};
//!
//! // Burger 100 × 2 + Coke 40 × 1, 40 off, 10% tax
//! let bill = compute_bill(Money::from_units(240), Money::from_units(40), TaxRate::from_bps(1000));
//! assert_eq!(bill.total.units(), 220);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod analytics;
pub mod bill_number;
pub mod billing;
pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use account::{Role, User};
pub use bill_number::NumberingStrategy;
pub use billing::{compute_bill, BillTotals};
pub use catalog::{Category, MenuItem, MenuItemKind};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines on a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Catches typos like 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price a line may carry.
pub const MAX_UNIT_PRICE: i64 = 10_000_000;

/// Highest subtotal an order may reach.
///
/// Keeps `subtotal × (1 + tax)` far inside `i64` when the bill is computed.
pub const MAX_ORDER_SUBTOTAL: i64 = 1_000_000_000;

/// Bills per page when the client does not ask.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page the history endpoint serves.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Cache key prefix for the open orders list.
pub const OPEN_ORDERS_CACHE_KEY: &str = "openOrders";

/// Cache key prefix for analytics reports.
pub const DAILY_STATS_CACHE_PREFIX: &str = "dailyStats";

/// Cache key prefix for menu and category listings.
pub const CATALOG_CACHE_PREFIX: &str = "catalog";
