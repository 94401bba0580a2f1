//! Service layer between the HTTP routes and the database.

pub mod account_service;
pub mod catalog_service;
pub mod order_service;
pub mod report_service;

pub use account_service::{AccountService, LoginResponse};
pub use catalog_service::CatalogService;
pub use order_service::{ListBillsQuery, OrderService};
pub use report_service::{AnalyticsQuery, ReportService};
