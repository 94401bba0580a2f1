//! # Billing API
//!
//! REST server for the Dine POS web client: table orders, bill generation,
//! settlement, bill history, sales analytics, the menu catalog and staff
//! login.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Billing API                                     │
//! │                                                                         │
//! │  Web client ──► axum Router ──► AuthUser (JWT, where required)         │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  ┌────────────────────────────┐   ┌──────────────────────────────────┐ │
//! │  │  OrderService              │   │  ReportService • analytics       │ │
//! │  │  • save / generate_bill    │   │  CatalogService • catalog        │ │
//! │  │  • settle / cancel / delete│   │  AccountService • login / logout │ │
//! │  │  • list_open / list_bills  │   │    (SessionRegistry, argon2)     │ │
//! │  └─────────────┬──────────────┘   └────────────────┬─────────────────┘ │
//! │                │                                   │                   │
//! │                ▼                                   ▼                   │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │  dine-db (SQLite)            │   │  ReadCache (TTL, prefixes)   │   │
//! │  └──────────────────────────────┘   └──────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - HTTP port (default: 5000)
//! - `BIND_ADDR` - Interface to bind (default: 0.0.0.0)
//! - `DATABASE_PATH` - SQLite file (default: ./dine.db)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - Secret for signing and validating bearer tokens
//! - `JWT_LIFETIME_SECS` - Token lifetime (default: 86400)
//! - `ADMIN_MAX_CONCURRENT_LOGINS` / `STAFF_MAX_CONCURRENT_LOGINS` - Live
//!   sessions per account (1 / 5); `CUSTOMER_MAX_CONCURRENT_LOGINS` is read
//!   when the staff variable is unset
//! - `OPEN_ORDERS_TTL_SECS` / `DAILY_STATS_TTL_SECS` / `CATALOG_TTL_SECS` -
//!   Cache lifetimes (10 / 30 / 60)
//! - `CACHE_SWEEP_INTERVAL_SECS` - Expired entry sweep (default: 300)
//! - `BILL_NUMBERING` - `sequential` (default) or `timestamp`
//! - `ALLOW_DIRECT_SETTLEMENT` - Accept Open → Paid (default: false)

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod sessions;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::build_router;
pub use state::AppState;
