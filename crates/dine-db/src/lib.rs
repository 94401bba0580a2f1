//! # dine-db
//!
//! SQLite persistence for Dine POS orders, the menu catalog and login
//! accounts, via sqlx.
//!
//! One `orders` table holds every order from first save to payment or
//! cancellation. The schema does the concurrency work: `bill_number` is
//! UNIQUE, a partial index allows one Open or Billed order per table, and
//! every status change is a conditional UPDATE that reports whether the row
//! actually moved. Retrying and re-reading after a refusal is left to
//! billing-api's `OrderService`.
//!
//! - [`pool`] - `DbConfig` and the `Database` handle
//! - [`migrations`] - schema files embedded from `migrations/sqlite`
//! - [`error`] - `DbError` and unique-violation matching
//! - [`repository`] - order reads and writes, sales report queries, catalog
//!   and user accounts
//!
//! ```rust,ignore
//! use dine_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./dine.db")).await?;
//! let open = db.orders().list_active().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::{BillUpdate, OrderRepository};
pub use repository::catalog::{CategoryRepository, MenuRepository};
pub use repository::report::ReportRepository;
pub use repository::user::{UserRecord, UserRepository};
