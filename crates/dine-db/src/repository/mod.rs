//! # Repository Module
//!
//! Database repository implementations for Dine POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  OrderService                                                          │
//! │       │                                                                 │
//! │       │  db.orders().apply_bill(id, &update)                           │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── find_active_for_table / get_by_id / list_active / list_paid      │
//! │  ├── insert_open / update_open                                         │
//! │  ├── apply_bill / settle / cancel   (conditional on current status)   │
//! │  └── delete                                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Status changes are single UPDATE statements guarded by               │
//! │  `WHERE status = ...`; they report whether a row moved instead of      │
//! │  reading first and writing second.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OrderRepository`](order::OrderRepository) - Order lifecycle writes and reads
//! - [`ReportRepository`](report::ReportRepository) - Sales aggregates
//! - [`CategoryRepository`](catalog::CategoryRepository) / [`MenuRepository`](catalog::MenuRepository) - Menu catalog
//! - [`UserRepository`](user::UserRepository) - Login accounts

pub mod catalog;
pub mod order;
pub mod report;
pub mod user;
